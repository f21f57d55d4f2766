use half::{bf16, f16};

/// Element types parameter files may store.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub enum DataType {
    BF16,
    F16,
    F32,
    F64,
}

impl DataType {
    pub fn size_in_bits(&self) -> usize {
        match self {
            DataType::BF16 => 16,
            DataType::F16 => 16,
            DataType::F32 => 32,
            DataType::F64 => 64,
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bits().div_ceil(8)
    }

    /// Decodes little-endian `bytes` of this type into `f32` values.
    pub fn decode_f32(
        &self,
        bytes: &[u8],
    ) -> Vec<f32> {
        let element_size = self.size_in_bytes();
        bytes
            .chunks_exact(element_size)
            .map(|chunk| match self {
                DataType::BF16 => {
                    bf16::from_le_bytes([chunk[0], chunk[1]]).to_f32()
                },
                DataType::F16 => {
                    f16::from_le_bytes([chunk[0], chunk[1]]).to_f32()
                },
                DataType::F32 => {
                    f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
                },
                DataType::F64 => {
                    let mut buffer = [0u8; 8];
                    buffer.copy_from_slice(chunk);
                    f64::from_le_bytes(buffer) as f32
                },
            })
            .collect()
    }
}
