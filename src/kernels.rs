//! Reference workloads shared by the in-process channels and the `backwards`
//! worker binary.
//!
//! Each workload owns its inputs and gradient buffers. One `step` runs
//! [`REPEATS`] forward/backward passes with an upstream gradient of ones and
//! zeroes the gradients after each pass, so repeated steps see identical
//! state.

use rand::Rng;

/// Forward/backward passes per step.
pub const REPEATS: usize = 100;

fn random_vec(rng: &mut impl Rng, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.gen::<f32>()).collect()
}

/// `(a * b) / (c + 1)`, element-wise, differentiated w.r.t. `a`, `b` and `c`.
#[derive(Clone, Debug)]
pub struct ArithmeticBackwards {
    a: Vec<f32>,
    b: Vec<f32>,
    c: Vec<f32>,
    out: Vec<f32>,
    grad_a: Vec<f32>,
    grad_b: Vec<f32>,
    grad_c: Vec<f32>,
}

impl ArithmeticBackwards {
    pub const LEN: usize = 1000;

    pub fn new(rng: &mut impl Rng) -> Self {
        Self::with_len(rng, Self::LEN)
    }

    pub fn with_len(rng: &mut impl Rng, len: usize) -> Self {
        Self {
            a: random_vec(rng, len),
            b: random_vec(rng, len),
            c: random_vec(rng, len),
            out: vec![0.0; len],
            grad_a: vec![0.0; len],
            grad_b: vec![0.0; len],
            grad_c: vec![0.0; len],
        }
    }

    fn pass(&mut self) {
        for i in 0..self.a.len() {
            let (a, b) = (self.a[i], self.b[i]);
            let denom = self.c[i] + 1.0;
            self.out[i] = a * b / denom;

            // Upstream gradient is one.
            self.grad_a[i] += b / denom;
            self.grad_b[i] += a / denom;
            self.grad_c[i] += -(a * b) / (denom * denom);
        }
    }

    fn zero_grad(&mut self) {
        self.grad_a.fill(0.0);
        self.grad_b.fill(0.0);
        self.grad_c.fill(0.0);
    }

    /// Returns the last forward output's sum.
    pub fn step(&mut self) -> f32 {
        for _ in 0..REPEATS {
            self.pass();
            self.zero_grad();
        }
        self.out.iter().sum()
    }

    pub fn gradients(&mut self) -> (&[f32], &[f32], &[f32]) {
        self.pass();
        (&self.grad_a, &self.grad_b, &self.grad_c)
    }
}

/// `A x + b` with `A` of shape `rows x cols`, differentiated w.r.t. `A` and `b`.
#[derive(Clone, Debug)]
pub struct AffineBackwards {
    rows: usize,
    cols: usize,
    a: Vec<f32>,
    x: Vec<f32>,
    b: Vec<f32>,
    out: Vec<f32>,
    grad_a: Vec<f32>,
    grad_b: Vec<f32>,
}

impl AffineBackwards {
    pub const ROWS: usize = 1000;
    pub const COLS: usize = 500;

    pub fn new(rng: &mut impl Rng) -> Self {
        Self::with_shape(rng, Self::ROWS, Self::COLS)
    }

    pub fn with_shape(rng: &mut impl Rng, rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            x: random_vec(rng, cols),
            a: random_vec(rng, rows * cols),
            b: random_vec(rng, rows),
            out: vec![0.0; rows],
            grad_a: vec![0.0; rows * cols],
            grad_b: vec![0.0; rows],
        }
    }

    fn pass(&mut self) {
        for r in 0..self.rows {
            let row = &self.a[r * self.cols..(r + 1) * self.cols];
            let dot: f32 = row.iter().zip(&self.x).map(|(a, x)| a * x).sum();
            self.out[r] = dot + self.b[r];
        }

        for r in 0..self.rows {
            let grad_row = &mut self.grad_a[r * self.cols..(r + 1) * self.cols];
            for (g, x) in grad_row.iter_mut().zip(&self.x) {
                *g += x;
            }
            self.grad_b[r] += 1.0;
        }
    }

    fn zero_grad(&mut self) {
        self.grad_a.fill(0.0);
        self.grad_b.fill(0.0);
    }

    pub fn step(&mut self) -> f32 {
        for _ in 0..REPEATS {
            self.pass();
            self.zero_grad();
        }
        self.out.iter().sum()
    }

    pub fn gradients(&mut self) -> (&[f32], &[f32]) {
        self.pass();
        (&self.grad_a, &self.grad_b)
    }
}
