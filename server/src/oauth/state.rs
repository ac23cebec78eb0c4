use rand::{thread_rng, RngCore};

/// Number of random bytes behind each anti-forgery state value
const STATE_BYTES: usize = 32;

/// Generate a fresh, URL-safe anti-forgery value for one login attempt
pub fn generate_state() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    let mut bytes = [0u8; STATE_BYTES];
    thread_rng().fill_bytes(&mut bytes);

    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compare the state echoed by the provider with the one we issued
///
/// Runs in time independent of where the values first differ.
pub fn state_matches(expected: &str, received: &str) -> bool {
    let (expected, received) = (expected.as_bytes(), received.as_bytes());
    if expected.len() != received.len() {
        return false;
    }

    expected
        .iter()
        .zip(received)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_state_is_url_safe() {
        let state = generate_state();

        // 32 bytes base64url without padding
        assert_eq!(state.len(), 43);
        assert!(state
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_generated_states_are_unique() {
        assert_ne!(generate_state(), generate_state());
    }

    #[test]
    fn test_state_matches() {
        let state = generate_state();

        assert!(state_matches(&state, &state.clone()));
        assert!(!state_matches(&state, &generate_state()));
        assert!(!state_matches(&state, ""));
        assert!(!state_matches("abc", "abcd"));
    }
}
