use rand::Rng;

/// Uppercase alphabet without look-alikes (0/O, 1/I/L) so codes survive being read off paper.
const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

pub const PUBLIC_CODE_LEN: usize = 6;

pub fn generate_public_code() -> String {
    let mut rng = rand::thread_rng();
    (0..PUBLIC_CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
