use crate::models::PollRecord;

pub const PROMPT_INTRO: &str = "You are a data scientist and analyst specialising in consumer micro-surveys. \
Each survey asks one binary-choice question. The record below lists, in order: creation date, post id, \
whether the question was user generated, whether it is sponsored, sponsor id, question caption, option 1, \
option 2, total responses, responses for option 1, share for option 1, responses for option 2, share for \
option 2, views, likes, comments, bookmarks and skips. Survey record: ";

pub const REPORT_INSTRUCTIONS: &str = ". Please write a concise report on this survey. Start with a short \
analysis of how respondents split between the two options and how confident we can be in that split given \
the number of responses. Follow with a summary paragraph stating the single most useful insight for the \
sponsor. Finish with three follow-up questions the sponsor could ask next, each written as a binary choice \
between two short options.";

pub const ADDITIONAL_GUIDELINES: &str = " Follow-up questions should not be about the survey itself or its \
engagement numbers. Do not comment on the quality of views, likes, comments, bookmarks or skips, and do not \
invent data that is not in the record.";

pub fn build_prompt(poll: &PollRecord) -> String {
    let data = poll.field_values().join(",");
    let mut prompt =
        String::with_capacity(PROMPT_INTRO.len() + data.len() + REPORT_INSTRUCTIONS.len() + ADDITIONAL_GUIDELINES.len());
    prompt.push_str(PROMPT_INTRO);
    prompt.push_str(&data);
    prompt.push_str(REPORT_INSTRUCTIONS);
    prompt.push_str(ADDITIONAL_GUIDELINES);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_poll;

    #[test]
    fn test_prompt_sections_in_fixed_order() {
        let prompt = build_prompt(&sample_poll("42", "acme"));
        assert!(prompt.starts_with("You are a data scientist and analyst"));
        assert!(prompt.ends_with(ADDITIONAL_GUIDELINES));

        let data_at = prompt.find(",42,false,false,acme,Question 42,Yes,No,0,60,0.6,40,0.4,0,0,0,0,0").unwrap();
        let instructions_at = prompt.find(". Please write a concise report").unwrap();
        let guidelines_at = prompt.find(" Follow-up questions should not be").unwrap();
        assert!(PROMPT_INTRO.len() <= data_at);
        assert!(data_at < instructions_at);
        assert!(instructions_at < guidelines_at);
    }
}
