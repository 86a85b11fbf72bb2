//! Groups repositories into satellite project families by name keyword.
//!
//! Satellites are tested in declaration order and the first one with a
//! matching keyword wins, so a name like `yomogi-sakura-bridge` lands in
//! YOMOGI. Names matching nothing go to OTHERS.

use crate::stats::Repository;

pub const OTHER_GROUP: &str = "OTHERS";

/// Satellite name and its keywords, in match priority order.
pub const SATELLITES: [(&str, &[&str]); 5] = [
    ("YOMOGI", &["yomogi", "ymg"]),
    ("KASHIWA", &["kashiwa", "ksh"]),
    ("SAKURA", &["sakura", "skr"]),
    ("BOTAN", &["botan", "btn"]),
    ("MOMIJI", &["momiji", "mmj"]),
];

#[derive(Debug)]
pub struct SatelliteGroup<'a> {
    pub name: &'static str,
    pub repos: Vec<&'a Repository>,
}

/// Which satellite a repository name belongs to.
pub fn classify(repo_name: &str) -> &'static str {
    let lower = repo_name.to_lowercase();
    SATELLITES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lower.contains(&kw.to_lowercase())))
        .map(|(name, _)| *name)
        .unwrap_or(OTHER_GROUP)
}

/// One group per satellite plus OTHERS, in fixed order, empty groups included.
pub fn group_by_satellite(repos: &[Repository]) -> Vec<SatelliteGroup<'_>> {
    let mut groups: Vec<SatelliteGroup<'_>> = SATELLITES
        .iter()
        .map(|(name, _)| *name)
        .chain(std::iter::once(OTHER_GROUP))
        .map(|name| SatelliteGroup {
            name,
            repos: Vec::new(),
        })
        .collect();

    for repo in repos {
        let bucket = classify(&repo.name);
        if let Some(group) = groups.iter_mut().find(|g| g.name == bucket) {
            group.repos.push(repo);
        }
    }

    groups
}
