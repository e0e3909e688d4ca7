use crate::models::PollRecord;
use log::warn;
use std::collections::BTreeSet;

// Case-insensitive substring match of a group name in the sponsor id.
pub fn visible_polls(all: &[PollRecord], groups: &BTreeSet<String>) -> Vec<PollRecord> {
    let groups: Vec<String> = groups
        .iter()
        .filter(|group| !group.is_empty())
        .map(|group| group.to_lowercase())
        .collect();

    if groups.is_empty() {
        return Vec::new();
    }

    let visible: Vec<PollRecord> = all
        .iter()
        .filter(|poll| {
            if poll.sponsor_id.is_empty() {
                return false;
            }
            let sponsor_id = poll.sponsor_id.to_lowercase();
            groups.iter().any(|group| sponsor_id.contains(group.as_str()))
        })
        .cloned()
        .collect();

    if visible.is_empty() && !all.is_empty() {
        warn!("No polls match user groups after filtering ({} polls loaded)", all.len());
    }

    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_poll;

    fn groups(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_empty_groups_deny_everything() {
        let polls = vec![sample_poll("1", "acme"), sample_poll("2", "globex")];
        assert!(visible_polls(&polls, &BTreeSet::new()).is_empty());
        assert!(visible_polls(&polls, &groups(&[""])).is_empty());
    }

    #[test]
    fn test_matches_group_case_insensitively() {
        let polls = vec![sample_poll("1", "Software_Reseller"), sample_poll("2", "globex")];
        let visible = visible_polls(&polls, &groups(&["software_reseller"]));
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].post_id, "1");
    }

    #[test]
    fn test_missing_sponsor_is_never_visible() {
        let polls = vec![sample_poll("1", ""), sample_poll("2", "acme")];
        let visible = visible_polls(&polls, &groups(&["acme", "a"]));
        assert_eq!(visible.iter().map(|p| p.post_id.as_str()).collect::<Vec<_>>(), vec!["2"]);
    }

    #[test]
    fn test_substring_containment_is_current_behavior() {
        // Group names that are substrings of unrelated sponsors still match.
        let polls = vec![sample_poll("1", "acme_corp"), sample_poll("2", "notacme"), sample_poll("3", "globex")];
        let visible = visible_polls(&polls, &groups(&["ACME"]));
        assert_eq!(visible.iter().map(|p| p.post_id.as_str()).collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn test_result_is_subset_and_each_match_contains_a_group() {
        let polls = vec![
            sample_poll("1", "acme"),
            sample_poll("2", "globex_emea"),
            sample_poll("3", "initech"),
            sample_poll("4", "GLOBEX"),
        ];
        let g = groups(&["globex", "acme"]);
        let visible = visible_polls(&polls, &g);
        assert_eq!(visible.len(), 3);
        for poll in &visible {
            assert!(polls.contains(poll));
            let sponsor = poll.sponsor_id.to_lowercase();
            assert!(g.iter().any(|group| sponsor.contains(&group.to_lowercase())));
        }
    }

    #[test]
    fn test_no_matches_is_an_empty_result_not_an_error() {
        let polls = vec![sample_poll("1", "acme")];
        assert!(visible_polls(&polls, &groups(&["globex"])).is_empty());
    }
}
