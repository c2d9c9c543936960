//! Cleanup of raw model text before JSON decoding.
//!
//! Each transform is a pure `&str -> String` function that returns its
//! input unchanged when its pattern is absent. New model quirks get a new
//! transform appended to [`TRANSFORMS`].

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";
const BOXED: &str = "\\boxed{";

/// Applied in order: fences first, since a boxed answer may sit inside one
pub const TRANSFORMS: &[fn(&str) -> String] = &[strip_code_fence, strip_boxed];

/// Run every transform until the text stops changing.
///
/// Each transform that fires makes the text strictly shorter, so this
/// terminates, and the result is a fixed point: `normalize` is idempotent.
pub fn normalize(raw: &str) -> String
{   let mut current = raw.to_string();
    loop
    {   let next = TRANSFORMS
          .iter()
          .fold(current.clone(), |text, transform| transform(&text));
        if next == current
        {   return current;
        }
        current = next;
    }
}

/// Keep only the interior of a ```` ```json ```` fenced block.
/// A missing closing fence keeps everything after the opener.
pub fn strip_code_fence(text: &str) -> String
{   // ASCII lowercasing keeps byte offsets intact
    let start = match text.to_ascii_lowercase().find(JSON_FENCE)
    {   Some(idx) => idx
      , None => return text.to_string()
    };
    let body = &text[start + JSON_FENCE.len()..];
    let interior = match body.find(FENCE)
    {   Some(end) => &body[..end]
      , None => body
    };
    interior.trim().to_string()
}

/// Keep only the interior of a LaTeX `\boxed{...}` wrapper.
/// Unbalanced braces leave the text untouched.
pub fn strip_boxed(text: &str) -> String
{   let start = match text.find(BOXED)
    {   Some(idx) => idx + BOXED.len()
      , None => return text.to_string()
    };
    match closing_brace(&text[start..])
    {   Some(len) => text[start..start + len].trim().to_string()
      , None => text.to_string()
    }
}

/// Byte offset of the `}` closing an already-open brace,
/// ignoring braces inside JSON string literals.
fn closing_brace(s: &str) -> Option<usize>
{   let mut depth = 1usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in s.char_indices()
    {   if in_string
        {   match ch
            {   _ if escaped => escaped = false
              , '\\' => escaped = true
              , '"' => in_string = false
              , _ => {}
            }
            continue;
        }
        match ch
        {   '"' => in_string = true
          , '{' => depth += 1
          , '}' => {
              depth -= 1;
              if depth == 0
              {   return Some(idx);
              }
            }
          , _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests
{   use super::*;

    const SAMPLES: &[&str] = &[
      ""
    , "{\"a\":1}"
    , "  {\"a\":1}  \n"
    , "plain prose reply"
    , "use `code` here"
    , "```python\nprint(1)\n```"
    , "```json\n{\"a\":1}\n```"
    , "Sure! ```JSON\n{\"a\":1}\n``` hope that helps"
    , "```json\n{\"a\":1}"
    , "\\boxed{{\"a\":1}}"
    , "The answer is \\boxed{{\"a\":\"}\"}} done"
    , "\\boxed{{\"a\":1}"
    , "```json\n\\boxed{{\"a\":1}}\n```"
    , "\\boxed{```json\n{\"a\":1}\n```}"
    , "```json\n```json\n{}\n```\n```"
    , "\\boxed{\\boxed{{\"a\":[1,2]}}}"
    ];

    #[test]
    fn strips_json_fence()
    {   assert_eq!(normalize("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn strips_boxed_wrapper_to_parseable_json()
    {   let out = normalize(r#"\boxed{{"a":1}}"#);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, serde_json::json!({"a": 1}));
    }

    #[test]
    fn boxed_inside_fence_is_fully_unwrapped()
    {   let out = normalize("```json\n\\boxed{{\"serviceSuggestions\":[]}}\n```");
        assert_eq!(out, "{\"serviceSuggestions\":[]}");
    }

    #[test]
    fn braces_inside_strings_do_not_close_the_box()
    {   let out = normalize(r#"\boxed{{"a":"}"}}"#);
        assert_eq!(out, r#"{"a":"}"}"#);
    }

    #[test]
    fn unbalanced_box_is_left_alone()
    {   let raw = r#"\boxed{{"a":1}"#;
        assert_eq!(normalize(raw), raw);
    }

    #[test]
    fn unterminated_fence_keeps_rest()
    {   assert_eq!(normalize("```json\n{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn text_without_patterns_is_untouched()
    {   for raw in [
          ""
        , "  {\"a\":1}  \n"
        , "plain prose reply"
        , "use `code` here"
        , "```python\nprint(1)\n```"
        , "boxed{not latex}"
        ]
        {   assert_eq!(normalize(raw), raw, "input: {:?}", raw);
        }
    }

    #[test]
    fn normalize_is_idempotent()
    {   for raw in SAMPLES
        {   let once = normalize(raw);
            assert_eq!(normalize(&once), once, "input: {:?}", raw);
        }
    }
}
