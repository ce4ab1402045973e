use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use rand::RngCore;

fn main() {
    let mut secret = [0u8; 64];
    rand::rng().fill_bytes(&mut secret);
    let encoded_secret = STANDARD_NO_PAD.encode(secret);
    println!("HS256 JWT signing secret (Base-64 encoded): {encoded_secret}");
}
