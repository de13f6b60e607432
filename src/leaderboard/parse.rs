use crate::constants::{
    EMPTY_RECORD_NAME, EMPTY_RESPONSE_SCORE, LEADERBOARD_CAPACITY, MALFORMED_RESPONSE_SCORE,
    TABLE_HEADER,
};
use crate::types::{LeaderboardSnapshot, ScoreRecord, ScoreThresholds, SnapshotStatus};

/// Parses the `name\tscore` table served by the scores endpoint.
///
/// Rows keep server order. A body with at most one usable line becomes a single synthetic
/// record: the header alone (or nothing) reads as empty data, anything else as malformed.
pub fn parse_scores_table(body: &str) -> LeaderboardSnapshot {
    let lines: Vec<&str> = body
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .collect();

    match lines.as_slice() {
        [] => return empty_snapshot(),
        [only] if is_header(only) => return empty_snapshot(),
        [only] => {
            let name = only.split('\t').next().unwrap_or(only).trim();
            tracing::warn!(response = name, "leaderboard returned a single line");
            return LeaderboardSnapshot::synthetic(
                SnapshotStatus::Malformed,
                name,
                MALFORMED_RESPONSE_SCORE,
            );
        }
        _ => {}
    }

    let rows = if is_header(lines[0]) { &lines[1..] } else { &lines[..] };
    let mut records = Vec::with_capacity(rows.len().min(LEADERBOARD_CAPACITY));
    for row in rows {
        match parse_row(row) {
            Some(record) => records.push(record),
            None => tracing::warn!(row = *row, "skipping unparsable leaderboard row"),
        }
    }

    if records.len() > LEADERBOARD_CAPACITY {
        tracing::debug!(count = records.len(), "truncating leaderboard to capacity");
        records.truncate(LEADERBOARD_CAPACITY);
    }
    if records.is_empty() {
        return empty_snapshot();
    }
    LeaderboardSnapshot::live(records)
}

/// Thresholds implied by a fetch. Synthetic snapshots leave `previous` untouched.
pub fn derive_thresholds(
    snapshot: &LeaderboardSnapshot,
    previous: ScoreThresholds,
) -> ScoreThresholds {
    if !snapshot.is_live() {
        return previous;
    }
    let (Some(first), Some(last)) = (snapshot.records.first(), snapshot.records.last()) else {
        return previous;
    };
    let lowest_of_top = if snapshot.records.len() < 2 {
        first.score
    } else {
        last.score
    };
    ScoreThresholds {
        high_score: first.score,
        lowest_of_top,
    }
}

pub fn escape_name(name: &str) -> String {
    name.replace('\t', "\\\t")
}

pub fn unescape_name(name: &str) -> String {
    name.replace("\\\t", "\t")
}

fn parse_row(row: &str) -> Option<ScoreRecord> {
    let (name, score) = row.rsplit_once('\t')?;
    let score = score.trim().parse::<i32>().ok()?;
    Some(ScoreRecord::new(unescape_name(name), score))
}

fn is_header(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(TABLE_HEADER)
}

fn empty_snapshot() -> LeaderboardSnapshot {
    LeaderboardSnapshot::synthetic(SnapshotStatus::Empty, EMPTY_RECORD_NAME, EMPTY_RESPONSE_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_in_server_order() {
        let snapshot = parse_scores_table("name\tscore\nAlice\t500\nBob\t300\n");
        assert_eq!(snapshot.status, SnapshotStatus::Live);
        assert_eq!(
            snapshot.records,
            vec![ScoreRecord::new("Alice", 500), ScoreRecord::new("Bob", 300)]
        );
        let thresholds = derive_thresholds(&snapshot, ScoreThresholds::unknown());
        assert_eq!(thresholds.high_score, 500);
        assert_eq!(thresholds.lowest_of_top, 300);
    }

    #[test]
    fn client_does_not_resort_rows() {
        let snapshot = parse_scores_table("name\tscore\nLow\t10\nHigh\t900\n");
        assert_eq!(snapshot.records[0].name, "Low");
    }

    #[test]
    fn single_line_is_malformed() {
        let snapshot = parse_scores_table("SERVER DOWN\n");
        assert_eq!(snapshot.status, SnapshotStatus::Malformed);
        assert_eq!(snapshot.records, vec![ScoreRecord::new("SERVER DOWN", -123)]);

        let previous = ScoreThresholds {
            high_score: 800,
            lowest_of_top: 120,
        };
        assert_eq!(derive_thresholds(&snapshot, previous), previous);
    }

    #[test]
    fn empty_and_header_only_bodies_are_empty_data() {
        for body in ["", "\n\n", "name\tscore\n"] {
            let snapshot = parse_scores_table(body);
            assert_eq!(snapshot.status, SnapshotStatus::Empty, "{body:?}");
            assert_eq!(snapshot.records, vec![ScoreRecord::new("NO DATA", 0)]);
        }
    }

    #[test]
    fn bad_rows_are_skipped_not_fatal() {
        let snapshot = parse_scores_table("name\tscore\nAlice\tlots\nBob\t300\nno-tab-here\n");
        assert_eq!(snapshot.records, vec![ScoreRecord::new("Bob", 300)]);
    }

    #[test]
    fn all_rows_bad_reads_as_empty() {
        let snapshot = parse_scores_table("name\tscore\nAlice\tlots\n");
        assert_eq!(snapshot.status, SnapshotStatus::Empty);
    }

    #[test]
    fn escaped_tabs_stay_in_the_name() {
        let body = format!("name\tscore\n{}\t42\r\n", escape_name("Tab\tName"));
        let snapshot = parse_scores_table(&body);
        assert_eq!(snapshot.records, vec![ScoreRecord::new("Tab\tName", 42)]);
    }

    #[test]
    fn single_entry_sets_both_thresholds() {
        let snapshot = parse_scores_table("name\tscore\nSolo\t250\n");
        let thresholds = derive_thresholds(&snapshot, ScoreThresholds::unknown());
        assert_eq!(thresholds.high_score, 250);
        assert_eq!(thresholds.lowest_of_top, 250);
    }

    #[test]
    fn rows_beyond_capacity_are_dropped() {
        let mut body = String::from("name\tscore\n");
        for idx in 0..12 {
            body.push_str(&format!("P{idx}\t{}\n", 1_000 - idx));
        }
        let snapshot = parse_scores_table(&body);
        assert_eq!(snapshot.records.len(), LEADERBOARD_CAPACITY);
        assert_eq!(snapshot.records.last().map(|r| r.score), Some(991));
    }
}
