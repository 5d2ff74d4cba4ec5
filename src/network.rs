use crate::encoder::{EncodedState, STATE_LEN};
use crate::eval::{check_finite, ScoreError, ScoreFn};
use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_WEIGHTS_PATH: &str = "value_model.weights.bin";

/// flatten(8x8x12) -> dense(128, relu) -> dense(64, relu) -> dense(1, linear)
pub const ARCHITECTURE: [(usize, usize); 3] = [(STATE_LEN, 128), (128, 64), (64, 1)];

const MAGIC: &[u8; 8] = b"VALNET01";
const VERSION: u32 = 1;

// Below this many states a batch is scored on the calling thread.
const PAR_BATCH_MIN: usize = 8;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("weights file not found: {0}")]
    Missing(PathBuf),
    #[error("{context} ({path}): {source}")]
    Io {
        path: PathBuf,
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("bad weights magic in {0}")]
    BadMagic(PathBuf),
    #[error("unsupported weights version {0}")]
    Version(u32),
    #[error("weights hold {got} layers, expected {expected}")]
    LayerCount { got: usize, expected: usize },
    #[error("layer {layer} is {got:?}, expected {expected:?}")]
    Shape { layer: usize, got: (usize, usize), expected: (usize, usize) },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightsOrigin {
    Loaded,
    Fresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activation {
    Relu,
    Linear,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dense {
    pub inputs: usize,
    pub outputs: usize,
    pub kernel: Vec<f32>, // inputs x outputs
    pub bias: Vec<f32>,   // outputs
    activation: Activation,
}

impl Dense {
    fn glorot<R: Rng + ?Sized>(inputs: usize, outputs: usize, activation: Activation, rng: &mut R) -> Self {
        let limit = (6.0 / (inputs + outputs) as f32).sqrt();
        let dist = Uniform::new_inclusive(-limit, limit);
        let kernel = (0..inputs * outputs).map(|_| dist.sample(rng)).collect();
        Self { inputs, outputs, kernel, bias: vec![0.0; outputs], activation }
    }

    fn forward(&self, x: &[f32]) -> Vec<f32> {
        let mut y = self.bias.clone();
        for (i, &xi) in x.iter().enumerate() {
            // board inputs are mostly zero
            if xi == 0.0 { continue; }
            let row = &self.kernel[i * self.outputs..(i + 1) * self.outputs];
            for (yj, &w) in y.iter_mut().zip(row) { *yj += xi * w; }
        }
        if self.activation == Activation::Relu {
            for v in &mut y { if *v < 0.0 { *v = 0.0; } }
        }
        y
    }
}

fn activation_for(layer: usize) -> Activation {
    if layer + 1 == ARCHITECTURE.len() { Activation::Linear } else { Activation::Relu }
}

/// The value network. One definition shared by every front end.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueNet {
    layers: Vec<Dense>,
}

impl ValueNet {
    /// Glorot-uniform kernels and zero biases.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let layers = ARCHITECTURE
            .iter()
            .enumerate()
            .map(|(i, &(n_in, n_out))| Dense::glorot(n_in, n_out, activation_for(i), rng))
            .collect();
        Self { layers }
    }

    pub fn seeded(seed: u64) -> Self { Self::random(&mut SmallRng::seed_from_u64(seed)) }

    pub fn layers(&self) -> &[Dense] { &self.layers }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|l| l.kernel.len() + l.bias.len()).sum()
    }

    pub fn forward(&self, state: &EncodedState) -> f32 {
        self.forward_raw(state.as_slice())
    }

    fn forward_raw(&self, input: &[f32]) -> f32 {
        let mut x = input.to_vec();
        for layer in &self.layers { x = layer.forward(&x); }
        x.first().copied().unwrap_or(0.0)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        // Format (little endian):
        // magic: 8 bytes b"VALNET01"
        // u32 version, u32 layer_count
        // per layer: u32 inputs, u32 outputs, f32 kernel[inputs*outputs], f32 bias[outputs]
        let path = path.as_ref();
        let io = |context: &'static str| move |source| ModelError::Io { path: path.to_path_buf(), context, source };
        let f = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound { ModelError::Missing(path.to_path_buf()) } else { io("open weights")(e) }
        })?;
        let mut r = BufReader::new(f);
        let mut magic = [0u8; 8];
        r.read_exact(&mut magic).map_err(io("read magic"))?;
        if &magic != MAGIC { return Err(ModelError::BadMagic(path.to_path_buf())); }
        let version = read_u32(&mut r).map_err(io("read version"))?;
        if version != VERSION { return Err(ModelError::Version(version)); }
        let count = read_u32(&mut r).map_err(io("read layer count"))? as usize;
        if count != ARCHITECTURE.len() {
            return Err(ModelError::LayerCount { got: count, expected: ARCHITECTURE.len() });
        }
        let mut layers = Vec::with_capacity(count);
        for (layer, &expected) in ARCHITECTURE.iter().enumerate() {
            let inputs = read_u32(&mut r).map_err(io("read layer shape"))? as usize;
            let outputs = read_u32(&mut r).map_err(io("read layer shape"))? as usize;
            if (inputs, outputs) != expected {
                return Err(ModelError::Shape { layer, got: (inputs, outputs), expected });
            }
            let kernel = read_f32s(&mut r, inputs * outputs).map_err(io("read kernel"))?;
            let bias = read_f32s(&mut r, outputs).map_err(io("read bias"))?;
            layers.push(Dense { inputs, outputs, kernel, bias, activation: activation_for(layer) });
        }
        info!("loaded {} parameters from {}", layers.iter().map(|l| l.kernel.len() + l.bias.len()).sum::<usize>(), path.display());
        Ok(Self { layers })
    }

    /// Writes the weights to `path`, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let path = path.as_ref();
        let io = |context: &'static str| move |source| ModelError::Io { path: path.to_path_buf(), context, source };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io("create weights dir"))?;
        }
        let mut w = BufWriter::new(File::create(path).map_err(io("create weights"))?);
        self.write_to(&mut w).map_err(io("write weights"))?;
        w.flush().map_err(io("flush weights"))?;
        info!("saved {} parameters to {}", self.parameter_count(), path.display());
        Ok(())
    }

    fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(MAGIC)?;
        w.write_all(&VERSION.to_le_bytes())?;
        w.write_all(&(self.layers.len() as u32).to_le_bytes())?;
        for l in &self.layers {
            w.write_all(&(l.inputs as u32).to_le_bytes())?;
            w.write_all(&(l.outputs as u32).to_le_bytes())?;
            for v in l.kernel.iter().chain(&l.bias) {
                w.write_all(&v.to_le_bytes())?;
            }
        }
        Ok(())
    }
}

fn read_u32<R: Read>(r: &mut R) -> std::io::Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_le_bytes(b))
}

fn read_f32s<R: Read>(r: &mut R, n: usize) -> std::io::Result<Vec<f32>> {
    let mut buf = vec![0u8; n * 4];
    r.read_exact(&mut buf)?;
    Ok(buf.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect())
}

/// Loads weights when the file exists, otherwise starts from random ones.
pub fn load_or_init<P: AsRef<Path>>(path: P, seed: Option<u64>) -> Result<(ValueNet, WeightsOrigin), ModelError> {
    let path = path.as_ref();
    if path.exists() {
        info!("weights found, loading {}", path.display());
        return Ok((ValueNet::load(path)?, WeightsOrigin::Loaded));
    }
    info!("no weights at {}, starting from random initialization", path.display());
    let mut rng = match seed {
        Some(s) => SmallRng::seed_from_u64(s),
        None => SmallRng::from_entropy(),
    };
    Ok((ValueNet::random(&mut rng), WeightsOrigin::Fresh))
}

/// For front ends that must not play with untrained weights.
pub fn load_required<P: AsRef<Path>>(path: P) -> Result<ValueNet, ModelError> {
    let path = path.as_ref();
    if !path.exists() { return Err(ModelError::Missing(path.to_path_buf())); }
    ValueNet::load(path)
}

impl ScoreFn for ValueNet {
    fn score(&self, state: &EncodedState) -> Result<f32, ScoreError> {
        check_finite(self.forward(state))
    }

    fn score_batch(&self, states: &[EncodedState]) -> Result<Vec<f32>, ScoreError> {
        if states.len() < PAR_BATCH_MIN {
            return states.iter().map(|s| self.score(s)).collect();
        }
        states.par_iter().map(|s| self.score(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_forward_shapes() {
        let net = ValueNet::seeded(7);
        assert_eq!(net.layers().len(), 3);
        assert_eq!(net.parameter_count(), 768 * 128 + 128 + 128 * 64 + 64 + 64 + 1);
        let v = net.forward(&EncodedState::zeros());
        // zero input and zero biases
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_glorot_bounds() {
        let net = ValueNet::seeded(1);
        let limit = (6.0f32 / (768.0 + 128.0)).sqrt();
        assert!(net.layers()[0].kernel.iter().all(|w| w.abs() <= limit));
        assert!(net.layers()[0].bias.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_batch_matches_single() {
        let net = ValueNet::seeded(3);
        let states: Vec<EncodedState> = (0..20)
            .map(|i| {
                let mut v = vec![0.0; STATE_LEN];
                v[i * 13] = 1.0;
                EncodedState::from_values(v).unwrap()
            })
            .collect();
        let batch = net.score_batch(&states).unwrap();
        let single: Vec<f32> = states.iter().map(|s| net.score(s).unwrap()).collect();
        assert_eq!(batch, single);
    }
}
