use lz4_flex::block::DecompressError;
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    None,
    LZ4,
}

#[derive(Debug, Clone)]
pub struct CompressionMetrics {
    pub original_size: usize,
    pub compressed_size: usize,
    pub compression_time: Duration,
    pub algorithm: CompressionAlgorithm,
}

impl CompressionMetrics {
    pub fn compression_ratio(&self) -> f32 {
        if self.original_size == 0 {
            return 1.0;
        }
        self.compressed_size as f32 / self.original_size as f32
    }
}

/// Snapshot payload compressor
pub struct Compressor {
    algorithm: CompressionAlgorithm,
}

impl Compressor {
    pub fn new(algorithm: CompressionAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> CompressionAlgorithm {
        self.algorithm
    }

    pub fn compress(&self, data: &[u8]) -> (Vec<u8>, CompressionMetrics) {
        let start = Instant::now();

        let compressed = match self.algorithm {
            CompressionAlgorithm::None => data.to_vec(),
            CompressionAlgorithm::LZ4 => compress_prepend_size(data),
        };

        let metrics = CompressionMetrics {
            original_size: data.len(),
            compressed_size: compressed.len(),
            compression_time: start.elapsed(),
            algorithm: self.algorithm,
        };

        (compressed, metrics)
    }

    /// Reverses [`Compressor::compress`] for data written with `algorithm`
    pub fn decompress(
        algorithm: CompressionAlgorithm,
        data: &[u8],
    ) -> Result<Vec<u8>, DecompressError> {
        match algorithm {
            CompressionAlgorithm::None => Ok(data.to_vec()),
            CompressionAlgorithm::LZ4 => decompress_size_prepended(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lz4_shrinks_repetitive_data() {
        let data = b"neuron neuron neuron neuron neuron neuron neuron neuron".repeat(20);
        let compressor = Compressor::new(CompressionAlgorithm::LZ4);

        let (compressed, metrics) = compressor.compress(&data);
        assert!(metrics.compression_ratio() < 0.5);
        assert_eq!(metrics.original_size, data.len());

        let restored = Compressor::decompress(CompressionAlgorithm::LZ4, &compressed).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn test_lz4_rejects_garbage() {
        assert!(Compressor::decompress(CompressionAlgorithm::LZ4, &[0xff; 3]).is_err());
    }
}
