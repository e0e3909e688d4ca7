use crate::models::PollRecord;

pub fn matching(polls: &[PollRecord], term: &str) -> Vec<PollRecord> {
    let term = term.to_lowercase();
    if term.is_empty() {
        return polls.to_vec();
    }

    polls
        .iter()
        .filter(|poll| {
            poll.caption.to_lowercase().contains(&term)
                || poll.option1.to_lowercase().contains(&term)
                || poll.option2.to_lowercase().contains(&term)
                || poll.response_count1.to_string().contains(&term)
                || poll.response_count2.to_string().contains(&term)
        })
        .cloned()
        .collect()
}
