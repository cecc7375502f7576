use crate::error::AppError;

const COST: u32 = 10;

pub fn hash_password(plain: &str) -> Result<String, AppError> {
    Ok(bcrypt::hash(plain, COST)?)
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_roundtrip() {
        let hash = bcrypt::hash("creations", 4).unwrap();
        assert!(verify_password("creations", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("creations", "not-a-hash"));
    }
}
