use crate::domain::port::PasswordHasher;
use sha2::{Digest, Sha256};

/// SHA-256の16進文字列でパスワードをハッシュ化する
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256PasswordHasher;

impl PasswordHasher for Sha256PasswordHasher {
    fn hash(&self, raw: &str) -> String {
        format!("{:x}", Sha256::digest(raw.as_bytes()))
    }
}
