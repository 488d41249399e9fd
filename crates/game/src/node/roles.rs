use crate::game::{PlayerId, PlayerInfo};

/// Deterministic deputy choice among the non-viewer players other than the
/// master. When the master holds the highest id the lowest candidate wins,
/// otherwise the highest one does.
pub fn pick_deputy<'a, I>(players: I, master_id: PlayerId) -> Option<PlayerId>
where
    I: IntoIterator<Item = &'a PlayerInfo>,
{
    let mut highest = master_id;
    let mut lowest_candidate: Option<PlayerId> = None;
    let mut highest_candidate: Option<PlayerId> = None;

    for player in players.into_iter().filter(|p| !p.is_viewer()) {
        highest = highest.max(player.id);
        if player.id == master_id {
            continue;
        }
        lowest_candidate = Some(lowest_candidate.map_or(player.id, |id| id.min(player.id)));
        highest_candidate = Some(highest_candidate.map_or(player.id, |id| id.max(player.id)));
    }

    if highest == master_id {
        lowest_candidate
    } else {
        highest_candidate
    }
}
