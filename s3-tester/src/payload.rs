//! Random object bodies.

use bytes::Bytes;
use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::session::TransferError;

/// Produces fresh bodies of a fixed size filled from the operating system's secure RNG.
///
/// Every call allocates a new buffer, so no two iterations upload the same contents.
#[derive(Clone, Copy, Debug)]
pub struct PayloadGenerator {
    size: usize,
}

impl PayloadGenerator {
    /// Creates a generator for bodies of exactly `size` bytes.
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// The size of every generated body.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Generates a new random body.
    ///
    /// A failing randomness source only fails the calling iteration.
    pub fn generate(&self) -> Result<Bytes, TransferError> {
        let mut buf = vec![0; self.size];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|err| TransferError::Entropy(Box::new(err)))?;
        Ok(Bytes::from(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_exact_size() {
        for size in [0, 1, 1024, 512 * 1024] {
            let payload = PayloadGenerator::new(size).generate().unwrap();
            assert_eq!(payload.len(), size);
        }
    }

    #[test]
    fn payloads_differ() {
        let generator = PayloadGenerator::new(64);
        let first = generator.generate().unwrap();
        let second = generator.generate().unwrap();

        assert_ne!(first, second);
        assert!(first.iter().any(|&byte| byte != 0));
    }
}
