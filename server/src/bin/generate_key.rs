use base64::{engine::general_purpose::STANDARD, Engine as _};
use color_eyre::eyre::Result;
use rand::RngCore as _;

/// Bytes of key material for the encrypted cookie key
const COOKIE_KEY_BYTES: usize = 64;
const JWT_SECRET_BYTES: usize = 32;

fn random_base64(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let cookie_key = random_base64(COOKIE_KEY_BYTES);
    let jwt_secret = random_base64(JWT_SECRET_BYTES);

    println!("Generated secrets for the session cookies.");
    println!();
    println!("Add the following to your .env file:");
    println!("COOKIE_KEY=\"{}\"", cookie_key);
    println!("JWT_SECRET=\"{}\"", jwt_secret);

    Ok(())
}
