/// Hands out object names that are unique for the lifetime of a session.
///
/// Names combine a per-session random salt with a monotonically increasing
/// counter, so two sessions (or two imports of the same file) never share a
/// name and nothing is ever reused.
#[derive(Debug)]
pub struct IdGenerator {
    salt: u32,
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::with_salt(rand::random())
    }

    pub fn with_salt(salt: u32) -> Self {
        Self { salt, next: 0 }
    }

    pub fn next(&mut self, prefix: &str) -> String {
        let n = self.next;
        self.next += 1;
        format!("{prefix}-{:08x}-{n}", self.salt)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
