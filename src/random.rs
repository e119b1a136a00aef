use rand::Rng;

const DATABASE_NAME_LEN: usize = 32;

/// Generate a random database name: 32 lowercase ASCII letters.
///
/// Letters only, so the name is valid on every platform MongoDB supports
/// (no `/\. "$` and no case-insensitive collisions on Windows).
pub fn random_database() -> String {
    let mut rng = rand::thread_rng();
    (0..DATABASE_NAME_LEN)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect()
}
