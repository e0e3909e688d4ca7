use crate::models::{fixed, PollRecord};

// Coefficients of the tail approximation shown in the chart footer. The
// displayed `p < X.XX` threshold depends on these exact values.
const LINEAR_COEFFICIENT: f64 = -0.717;
const QUADRATIC_COEFFICIENT: f64 = -0.416;

// None when there are no responses.
pub fn approximate_p_value(count1: u64, count2: u64) -> Option<f64> {
    let n = (count1 + count2) as f64;
    if n == 0.0 {
        return None;
    }

    let p1 = count1 as f64 / n;
    let p2 = count2 as f64 / n;
    let pooled = (count1 + count2) as f64 / (2.0 * n);

    let z = (p1 - p2) / (pooled * (1.0 - pooled) * (1.0 / n + 1.0 / n)).sqrt();
    let p_value = (LINEAR_COEFFICIENT * z + QUADRATIC_COEFFICIENT * z * z).exp();

    p_value.is_finite().then_some(p_value)
}

pub fn significance_label(poll: &PollRecord) -> Option<String> {
    approximate_p_value(poll.response_count1, poll.response_count2)
        .map(|p| format!("p < {} (n={})", fixed(p, 2), poll.total_count()))
}

// Ties go to the second option.
pub fn preferred_option(poll: &PollRecord) -> &str {
    if poll.response_count1 > poll.response_count2 {
        &poll.option1
    } else {
        &poll.option2
    }
}

pub fn preference_annotation(poll: &PollRecord) -> String {
    format!("Most people prefer {}", preferred_option(poll))
}
