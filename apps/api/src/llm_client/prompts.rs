// Shared prompt fragments and prompt-building utilities.
// Each service that needs model calls defines its own prompts.rs alongside it.

/// Persona fragment shared by every prompt that evaluates a candidate.
pub const HIRING_MANAGER_PERSONA: &str = "\
    You are a senior technical hiring manager and a domain expert for the role being filled. \
    You read résumés critically, you are specific about evidence, and you never invent \
    experience the candidate has not described.";

/// Substitutes `{name}` placeholders in a single left-to-right pass.
///
/// Substituted values are never rescanned, so a résumé that happens to contain
/// `{job_text}` is embedded verbatim. Unknown placeholders are left untouched.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(
        template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>(),
    );
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replacement = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });

        match replacement {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_replaces_all_occurrences() {
        let out = fill_template("{a} and {b} and {a}", &[("a", "x"), ("b", "y")]);
        assert_eq!(out, "x and y and x");
    }

    #[test]
    fn test_fill_template_does_not_rescan_values() {
        let out = fill_template(
            "R: {resume_text}\nJ: {job_text}",
            &[("resume_text", "see {job_text}"), ("job_text", "Rust")],
        );
        assert_eq!(out, "R: see {job_text}\nJ: Rust");
    }

    #[test]
    fn test_fill_template_leaves_unknown_and_json_braces() {
        let out = fill_template(r#"{"k": 1} {missing} {x}"#, &[("x", "ok")]);
        assert_eq!(out, r#"{"k": 1} {missing} ok"#);
    }

    #[test]
    fn test_fill_template_handles_unclosed_brace() {
        assert_eq!(fill_template("tail {x", &[("x", "y")]), "tail {x");
    }
}
