use lazy_static::lazy_static;
use regex::Regex;

// Search keywords end up in LIKE patterns so anything
// that has a meaning in there gets stripped, same for
// the few regex-looking special chars people paste in.
pub fn sanitize_keywords(keywords: &str, max_terms: usize) -> Vec<String> {
  // Since there's no way to define a const that uses
  // the heap, we need that lazy_static crate.
  lazy_static! {
    static ref TERM_CLEANUP: Regex = Regex::new(
      r"[%_*^$\\]"
    ).unwrap();
  }

  keywords
    .split_whitespace()
    .map(|t| TERM_CLEANUP.replace_all(t, "").to_string())
    .filter(|t| !t.is_empty())
    .take(max_terms)
    .collect()
}
