use super::error::StoreError;
use super::format::LeagueDoc;
use super::STORE_VERSION;
use crate::leaderboard::Leaderboard;

/// Migrate a league document from older versions to the current version.
pub fn migrate_doc(mut doc: LeagueDoc) -> Result<LeagueDoc, StoreError> {
    let original_version = doc.version;

    doc = match doc.version {
        0 => migrate_v0_to_v1(doc)?,
        1 => doc, // Current version, no migration needed
        v if v > STORE_VERSION => {
            // Future version - might be compatible
            log::warn!("Loading document from future version {} (current: {})", v, STORE_VERSION);
            doc
        }
        _ => {
            return Err(StoreError::VersionMismatch {
                found: doc.version,
                expected: STORE_VERSION,
            });
        }
    };

    doc.version = STORE_VERSION;
    doc.update_timestamp();

    if original_version != STORE_VERSION {
        log::info!("Migrated league document from version {} to {}", original_version, STORE_VERSION);
    }

    Ok(doc)
}

/// Migrate from version 0 to version 1.
///
/// Version 0 documents predate the incremental aggregate discipline: the
/// cached leaderboard may be missing or drifted, `processed` flags were not
/// tracked, and legacy records can carry a zero team size.
fn migrate_v0_to_v1(mut doc: LeagueDoc) -> Result<LeagueDoc, StoreError> {
    log::info!("Migrating league document from version 0 to 1");

    let set = &mut doc.league.set;

    // 1. Legacy records without a usable team size: infer from the rosters.
    for record in &mut set.match_history {
        if record.team_size == 0 {
            record.team_size =
                record.team_a.len().max(record.team_b.len()).clamp(1, 5) as u8;
        }
    }

    // 2. Rebuild or repair the cached aggregate against the Active fold.
    let folded = Leaderboard::full_recompute(&set.match_history);
    if set.leaderboard.is_empty() && !folded.is_empty() {
        log::info!("Rebuilding missing leaderboard from {} matches", set.match_history.len());
        set.leaderboard = folded;
    } else if !set.leaderboard.agrees_with(&folded) {
        log::warn!("Leaderboard disagreed with match history; repaired from full recompute");
        set.leaderboard = folded;
    }

    // 3. The aggregate now reflects every Active match, so mark them
    //    processed; a later incremental record on them must be a no-op.
    for record in &mut set.match_history {
        if record.is_active() {
            record.processed = true;
        }
    }

    Ok(doc)
}
