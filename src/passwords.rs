//! Sign-up password validation: an ordered rule chain that stops at the
//! first failure and reports a single, field-specific message.

/// Profile values the password is checked against for similarity.
#[derive(Debug, Default)]
pub struct UserAttributes<'a> {
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
}

const MIN_LENGTH: usize = 8;
const SIMILARITY_THRESHOLD: f64 = 0.7;

/// Validate a password against the full rule chain. The rules run in a
/// fixed order and the first failing rule wins.
pub fn validate(
    password: &str,
    confirmation: &str,
    attrs: &UserAttributes<'_>,
) -> Result<(), String> {
    if password != confirmation {
        return Err("The two password fields didn't match.".to_owned());
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err("This password is entirely numeric".to_owned());
    }

    if password.chars().count() < MIN_LENGTH {
        return Err(format!(
            "This password is too short. It must contain at least {MIN_LENGTH} characters."
        ));
    }

    let labelled = [
        (attrs.username, "username"),
        (attrs.first_name, "first name"),
        (attrs.last_name, "last name"),
        (attrs.email, "email"),
    ];
    for (value, label) in labelled {
        if !value.is_empty() && too_similar(password, value) {
            return Err(format!("The password is too similar to the {label}"));
        }
    }

    let lowered = password.to_lowercase();
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        return Err("This password is too common".to_owned());
    }

    Ok(())
}

/// Case-insensitive similarity between the password and one profile value:
/// containment of a non-trivial part, or edit-distance similarity at or
/// above the threshold. The value is also compared piecewise, split on
/// non-alphanumeric characters, so `jane.doe@example.com` flags `janedoe1`.
fn too_similar(password: &str, value: &str) -> bool {
    let password = password.to_lowercase();
    let value = value.to_lowercase();

    let parts = value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .chain(std::iter::once(value.as_str()));

    for part in parts {
        if part.chars().count() >= 4 && (password.contains(part) || part.contains(&password)) {
            return true;
        }
        if similarity(&password, part) >= SIMILARITY_THRESHOLD {
            return true;
        }
    }
    false
}

/// Normalized similarity in [0, 1]: 1 minus the Levenshtein distance over
/// the longer length.
fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Denylist of frequently used passwords, matched case-insensitively.
const COMMON_PASSWORDS: &[&str] = &[
    "000000", "111111", "112233", "121212", "123123", "123321", "1234", "12345", "123456",
    "1234567", "12345678", "123456789", "1234567890", "123qwe", "131313", "159753", "654321",
    "666666", "696969", "777777", "987654321", "aaaaaa", "abc123", "access", "admin", "amanda",
    "andrew", "ashley", "austin", "baseball", "batman", "biteme", "buster", "charlie", "cheese",
    "chelsea", "computer", "dallas", "daniel", "dragon", "flower", "football", "freedom",
    "george", "ginger", "harley", "hello", "hockey", "hunter", "iloveyou", "jennifer", "jessica",
    "jordan", "joshua", "killer", "letmein", "login", "love", "maggie", "master", "matrix",
    "matthew", "michael", "michelle", "monkey", "mustang", "nicole", "pass", "passw0rd",
    "password", "password1", "pepper", "princess", "qazwsx", "qwerty", "qwertyuiop", "ranger",
    "robert", "secret", "shadow", "soccer", "starwars", "summer", "sunshine", "superman",
    "taylor", "test", "thomas", "thunder", "tigger", "trustno1", "user", "welcome", "whatever",
    "yankees", "zxcvbn", "zxcvbnm",
];
