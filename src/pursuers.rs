use crate::constants::{kill_bonus, MAX_KILL_STREAK};
use crate::types::{PursuerMode, PursuerName};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScareChange {
    Frightened { deadline_ms: u64 },
    Calmed,
    Unchanged,
}

#[derive(Clone, Copy, Debug)]
struct PursuerSlot {
    mode: PursuerMode,
    present: bool,
}

#[derive(Clone, Debug)]
pub struct PursuerBehaviorState {
    slots: [PursuerSlot; 4],
    scared: bool,
    scare_deadline_ms: u64,
    scare_length_ms: u64,
    kill_streak: u32,
}

impl PursuerBehaviorState {
    pub fn new(scare_length_ms: u64) -> Self {
        Self {
            slots: [PursuerSlot {
                mode: PursuerMode::Normal,
                present: true,
            }; 4],
            scared: false,
            scare_deadline_ms: 0,
            scare_length_ms,
            kill_streak: 0,
        }
    }

    /// Marks which pursuers exist in the current level. Absent ones keep no mode.
    pub fn set_present(&mut self, name: PursuerName, present: bool) {
        self.slots[name.index()].present = present;
    }

    pub fn is_present(&self, name: PursuerName) -> bool {
        self.slots[name.index()].present
    }

    pub fn mode(&self, name: PursuerName) -> PursuerMode {
        self.slots[name.index()].mode
    }

    pub fn is_scared(&self) -> bool {
        self.scared
    }

    pub fn scare_deadline_ms(&self) -> u64 {
        self.scare_deadline_ms
    }

    pub fn kill_streak(&self) -> u32 {
        self.kill_streak
    }

    /// Frightens every present pursuer and re-arms the deadline. The kill streak carries over.
    pub fn frighten(&mut self, now_ms: u64) -> ScareChange {
        self.scared = true;
        self.scare_deadline_ms = now_ms.saturating_add(self.scare_length_ms);
        for slot in self.slots.iter_mut().filter(|slot| slot.present) {
            slot.mode = PursuerMode::Frightened;
        }
        tracing::debug!(deadline_ms = self.scare_deadline_ms, "pursuers frightened");
        ScareChange::Frightened {
            deadline_ms: self.scare_deadline_ms,
        }
    }

    pub fn calm(&mut self) -> ScareChange {
        self.scared = false;
        for slot in &mut self.slots {
            slot.mode = PursuerMode::Normal;
        }
        self.kill_streak = 0;
        ScareChange::Calmed
    }

    pub fn calm_one(&mut self, name: PursuerName) {
        self.slots[name.index()].mode = PursuerMode::Normal;
    }

    pub fn toggle_scare(&mut self, now_ms: u64) -> ScareChange {
        if self.scared {
            self.calm()
        } else {
            self.frighten(now_ms)
        }
    }

    /// Per-tick timer check. This is the only automatic mode change.
    pub fn update(&mut self, now_ms: u64) -> ScareChange {
        if self.scared && now_ms >= self.scare_deadline_ms {
            return self.calm();
        }
        ScareChange::Unchanged
    }

    pub fn record_elimination(&mut self) -> (u32, i32) {
        self.kill_streak = (self.kill_streak + 1).min(MAX_KILL_STREAK);
        (self.kill_streak, kill_bonus(self.kill_streak))
    }

    pub fn reset(&mut self) {
        self.calm();
        self.scare_deadline_ms = 0;
    }

    pub fn modes(&self) -> impl Iterator<Item = (PursuerName, PursuerMode, bool)> + '_ {
        PursuerName::ALL
            .into_iter()
            .map(|name| (name, self.mode(name), self.is_present(name)))
    }
}
