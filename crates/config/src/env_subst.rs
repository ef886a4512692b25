/// Replace `${ENV_VAR}` and `${ENV_VAR:-fallback}` placeholders in raw
/// config text.
///
/// Unset variables without a fallback are left as-is so the parse error (or
/// the gateway's rejection) names the missing variable.
pub fn substitute_env(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }
        chars.next(); // '{'

        let mut body = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == '}' {
                closed = true;
                break;
            }
            body.push(c);
        }

        if !closed || body.is_empty() {
            result.push_str("${");
            result.push_str(&body);
            continue;
        }

        let (name, fallback) = match body.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (body.as_str(), None),
        };

        match (std::env::var(name), fallback) {
            (Ok(val), _) => result.push_str(&val),
            (Err(_), Some(fallback)) => result.push_str(fallback),
            (Err(_), None) => {
                result.push_str("${");
                result.push_str(&body);
                result.push('}');
            },
        }
    }

    result
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_set_var() {
        unsafe { std::env::set_var("GATELINK_SUBST_URL", "http://gw:8080") };
        assert_eq!(
            substitute_env("url = \"${GATELINK_SUBST_URL}\""),
            "url = \"http://gw:8080\""
        );
        unsafe { std::env::remove_var("GATELINK_SUBST_URL") };
    }

    #[test]
    fn fallback_used_when_unset() {
        assert_eq!(
            substitute_env("${GATELINK_SUBST_NOPE_1:-redis://127.0.0.1:6379}"),
            "redis://127.0.0.1:6379"
        );
    }

    #[test]
    fn set_var_beats_fallback() {
        unsafe { std::env::set_var("GATELINK_SUBST_KEY", "custom:key") };
        assert_eq!(substitute_env("${GATELINK_SUBST_KEY:-default}"), "custom:key");
        unsafe { std::env::remove_var("GATELINK_SUBST_KEY") };
    }

    #[test]
    fn unset_without_fallback_is_kept() {
        assert_eq!(
            substitute_env("pw=${GATELINK_SUBST_NOPE_2}"),
            "pw=${GATELINK_SUBST_NOPE_2}"
        );
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        assert_eq!(substitute_env("a ${OPEN"), "a ${OPEN");
        assert_eq!(substitute_env("cost: $5"), "cost: $5");
    }
}
