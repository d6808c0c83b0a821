use uci::SearchLine;

/// Picks the variation that explains `best_move` (and `ponder`, when announced).
///
/// The first matching line wins unless a later one is strictly deeper and either
/// not losing or not worse than the current pick. A one-move pick is extended
/// with the ponder move.
pub fn select_line(
    lines: &[SearchLine],
    best_move: &str,
    ponder: Option<&str>,
) -> Option<SearchLine> {
    let mut selected: Option<&SearchLine> = None;

    for line in lines.iter().filter(|l| l.matches(best_move, ponder)) {
        selected = match selected {
            None => Some(line),
            Some(current)
                if line.depth() > current.depth()
                    && (line.score.is_non_negative() || line.score >= current.score) =>
            {
                Some(line)
            }
            keep => keep,
        };
    }

    selected.map(|line| {
        let mut line = line.clone();
        if let (1, Some(ponder)) = (line.pv.len(), ponder) {
            line.pv.push(ponder.to_string());
        }
        line
    })
}
