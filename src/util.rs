use itertools::Itertools;


// If a string consists of a single character, returns the character. Otherwise returns none.
pub fn as_single_char(s: &str) -> Option<char> {
    s.chars().collect_tuple().map(|(single_char,)| single_char)
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 { a + (b - a) * t }
