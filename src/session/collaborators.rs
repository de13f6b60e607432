use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::constants::PURSUER_SPAWNS;
use crate::error::MissingCollaborator;
use crate::types::{Position, PursuerName, Scene, SoundCue};

pub trait GameUi: Send {
    fn show_ready_screen(&mut self);
    fn show_game_over_screen(&mut self);
    fn show_qualifying_score_screen(&mut self);
}

pub trait SoundBoard: Send {
    fn play(&mut self, cue: SoundCue);
}

pub trait LifeIndicators: Send {
    /// Removes the last icon. Returns false when there was nothing to remove.
    fn remove_last(&mut self) -> bool;
}

pub trait SceneDirector: Send {
    fn load_scene(&mut self, scene: Scene);
}

pub trait PursuerBodies: Send {
    fn locate(&self, name: PursuerName) -> Option<Position>;
    fn place(&mut self, name: PursuerName, position: Position);
}

/// Everything the session calls out to. Any slot may be empty; calls into an empty slot
/// come back as `MissingCollaborator` and the session carries on without them.
#[derive(Default)]
pub struct Collaborators {
    pub ui: Option<Box<dyn GameUi>>,
    pub sound: Option<Box<dyn SoundBoard>>,
    pub lives: Option<Box<dyn LifeIndicators>>,
    pub scenes: Option<Box<dyn SceneDirector>>,
    pub pursuers: Option<Box<dyn PursuerBodies>>,
}

impl Collaborators {
    pub fn show_ready_screen(&mut self) -> Result<(), MissingCollaborator> {
        let ui = self.ui.as_mut().ok_or(MissingCollaborator("game ui"))?;
        ui.show_ready_screen();
        Ok(())
    }

    pub fn show_game_over_screen(&mut self) -> Result<(), MissingCollaborator> {
        let ui = self.ui.as_mut().ok_or(MissingCollaborator("game ui"))?;
        ui.show_game_over_screen();
        Ok(())
    }

    pub fn show_qualifying_score_screen(&mut self) -> Result<(), MissingCollaborator> {
        let ui = self.ui.as_mut().ok_or(MissingCollaborator("game ui"))?;
        ui.show_qualifying_score_screen();
        Ok(())
    }

    pub fn play(&mut self, cue: SoundCue) -> Result<(), MissingCollaborator> {
        let sound = self.sound.as_mut().ok_or(MissingCollaborator("sound board"))?;
        sound.play(cue);
        Ok(())
    }

    pub fn remove_life_indicator(&mut self) -> Result<bool, MissingCollaborator> {
        let lives = self
            .lives
            .as_mut()
            .ok_or(MissingCollaborator("life indicators"))?;
        Ok(lives.remove_last())
    }

    pub fn load_scene(&mut self, scene: Scene) -> Result<(), MissingCollaborator> {
        let scenes = self
            .scenes
            .as_mut()
            .ok_or(MissingCollaborator("scene director"))?;
        scenes.load_scene(scene);
        Ok(())
    }

    pub fn locate_pursuer(&self, name: PursuerName) -> Result<Option<Position>, MissingCollaborator> {
        let bodies = self
            .pursuers
            .as_ref()
            .ok_or(MissingCollaborator("pursuer bodies"))?;
        Ok(bodies.locate(name))
    }

    pub fn place_pursuer(
        &mut self,
        name: PursuerName,
        position: Position,
    ) -> Result<(), MissingCollaborator> {
        let bodies = self
            .pursuers
            .as_mut()
            .ok_or(MissingCollaborator("pursuer bodies"))?;
        bodies.place(name, position);
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct StaticPursuers {
    positions: BTreeMap<PursuerName, Position>,
}

impl StaticPursuers {
    pub fn new() -> Self {
        Self {
            positions: PURSUER_SPAWNS.into_iter().collect(),
        }
    }

    pub fn without(mut self, name: PursuerName) -> Self {
        self.positions.remove(&name);
        self
    }
}

impl Default for StaticPursuers {
    fn default() -> Self {
        Self::new()
    }
}

impl PursuerBodies for StaticPursuers {
    fn locate(&self, name: PursuerName) -> Option<Position> {
        self.positions.get(&name).copied()
    }

    fn place(&mut self, name: PursuerName, position: Position) {
        if let Some(slot) = self.positions.get_mut(&name) {
            *slot = position;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum CollaboratorCall {
    ShowReadyScreen,
    ShowGameOverScreen,
    ShowQualifyingScoreScreen,
    Play { cue: SoundCue },
    RemoveLifeIndicator { removed: bool },
    LoadScene { scene: Scene },
}

#[derive(Clone, Debug, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<CollaboratorCall>>>,
}

impl CallLog {
    fn push(&self, call: CollaboratorCall) {
        match self.calls.lock() {
            Ok(mut calls) => calls.push(call),
            Err(poisoned) => poisoned.into_inner().push(call),
        }
    }

    pub fn calls(&self) -> Vec<CollaboratorCall> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn take(&self) -> Vec<CollaboratorCall> {
        match self.calls.lock() {
            Ok(mut calls) => std::mem::take(&mut *calls),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

struct RecordingUi(CallLog);

impl GameUi for RecordingUi {
    fn show_ready_screen(&mut self) {
        self.0.push(CollaboratorCall::ShowReadyScreen);
    }

    fn show_game_over_screen(&mut self) {
        self.0.push(CollaboratorCall::ShowGameOverScreen);
    }

    fn show_qualifying_score_screen(&mut self) {
        self.0.push(CollaboratorCall::ShowQualifyingScoreScreen);
    }
}

struct RecordingSound(CallLog);

impl SoundBoard for RecordingSound {
    fn play(&mut self, cue: SoundCue) {
        self.0.push(CollaboratorCall::Play { cue });
    }
}

struct RecordingLives {
    log: CallLog,
    remaining: i32,
}

impl LifeIndicators for RecordingLives {
    fn remove_last(&mut self) -> bool {
        let removed = self.remaining > 0;
        if removed {
            self.remaining -= 1;
        }
        self.log.push(CollaboratorCall::RemoveLifeIndicator { removed });
        removed
    }
}

struct RecordingScenes(CallLog);

impl SceneDirector for RecordingScenes {
    fn load_scene(&mut self, scene: Scene) {
        self.0.push(CollaboratorCall::LoadScene { scene });
    }
}

impl Collaborators {
    /// A full set of headless collaborators that log every call into the returned `CallLog`.
    pub fn recording(life_icons: i32) -> (Self, CallLog) {
        let log = CallLog::default();
        let collaborators = Self {
            ui: Some(Box::new(RecordingUi(log.clone()))),
            sound: Some(Box::new(RecordingSound(log.clone()))),
            lives: Some(Box::new(RecordingLives {
                log: log.clone(),
                remaining: life_icons,
            })),
            scenes: Some(Box::new(RecordingScenes(log.clone()))),
            pursuers: Some(Box::new(StaticPursuers::new())),
        };
        (collaborators, log)
    }
}
