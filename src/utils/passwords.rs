use color_eyre::Result;
use eyre::WrapErr;
use rand::Rng;

// Argon2 with the default config and a random salt.
// The salt ends up embedded in the encoded hash string
// so only one column is needed in database.
pub fn hash(password: &str) -> Result<String> {
  let salt: [u8; 16] = rand::thread_rng().gen();
  argon2::hash_encoded(
    password.as_bytes(),
    &salt,
    &argon2::Config::default()
  )
    .context("Hashing a password")
}

// A stored hash that doesn't parse counts as a failed
// check, not as an error.
pub fn verify(encoded: &str, password: &str) -> bool {
  argon2::verify_encoded(encoded, password.as_bytes())
    .unwrap_or(false)
}
