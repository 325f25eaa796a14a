//! Text embedding seam.
//!
//! The reflectors only need two capabilities: turn text into a fixed-length
//! vector, and compare two vectors. `Embedder` is the swap point for a real
//! embedding service; `HashEmbedder` is the built-in deterministic
//! implementation (feature-hashed bag of tokens, L2-normalized), good enough
//! for offline ranking and fully reproducible in tests.
//!
//! Failure containment: encoding never raises outward. Empty or
//! whitespace-only input encodes to an empty vector, and similarity over
//! empty or mismatched vectors is 0.0.

/// Turns text into a fixed-length numeric vector.
pub trait Embedder: Send + Sync {
    /// Encode one text. Returns an empty vector for empty/whitespace-only
    /// input or on any internal failure.
    fn encode(&self, text: &str) -> Vec<f32>;

    /// Encode a batch. All-or-nothing: a failing batch returns an empty
    /// list rather than partial results.
    fn batch_encode(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.encode(t)).collect()
    }

    /// Output vector length for non-empty input.
    fn dimensions(&self) -> usize;
}

/// Cosine similarity between two vectors. Returns 0.0 if the lengths
/// mismatch or either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-12 {
        0.0
    } else {
        (dot / denom) as f32
    }
}

/// Deterministic local embedder: each token is hashed into one of `dims`
/// buckets with a hash-derived sign, and the result is L2-normalized.
/// Tokens sharing a bucket collide, which is acceptable at the default
/// dimension for the store sizes this crate targets.
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl Embedder for HashEmbedder {
    fn encode(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut vector = vec![0.0f32; self.dims];
        for token in &tokens {
            let hash = fnv1a(token.as_bytes());
            let index = (hash % self.dims as u64) as usize;
            // One hash bit decides the sign so collisions can cancel
            // instead of only accumulating.
            let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }

        let norm = vector.iter().map(|v| (*v as f64).powi(2)).sum::<f64>().sqrt();
        if norm < 1e-12 {
            // All tokens cancelled out; keep the fail-closed contract.
            return Vec::new();
        }
        for v in vector.iter_mut() {
            *v = (*v as f64 / norm) as f32;
        }
        vector
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// Lowercased alphanumeric runs; CJK codepoints become single-char tokens
/// since those scripts do not delimit words with whitespace.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if is_cjk(c) {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            tokens.push(c.to_string());
        } else if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

pub(crate) fn is_cjk(c: char) -> bool {
    ('\u{3000}'..='\u{9fff}').contains(&c)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
