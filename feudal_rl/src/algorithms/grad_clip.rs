//! Global gradient-norm clipping.
//!
//! Burn's `GradientClippingConfig::Norm` clips each parameter on its own; the
//! FeUdal update clips the L2 norm taken over every parameter gradient at
//! once. Both passes walk the module with a [`ModuleMapper`] and look the
//! gradients up by `ParamId`.

use burn::module::{AutodiffModule, ModuleMapper, Param};
use burn::optim::GradientsParams;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};

/// Offset added to the norm before computing the scale.
const CLIP_EPS: f32 = 1e-6;

/// Sums squared gradient entries of every visited parameter.
struct SquaredNormAccumulator<'a> {
    grads: &'a GradientsParams,
    sum_squares: f32,
}

impl<'a, B: AutodiffBackend> ModuleMapper<B> for SquaredNormAccumulator<'a> {
    fn map_float<const D: usize>(&mut self, param: Param<Tensor<B, D>>) -> Param<Tensor<B, D>> {
        if let Some(grad) = self.grads.get::<B::InnerBackend, D>(param.id.clone()) {
            self.sum_squares += grad.powf_scalar(2.0).sum().into_scalar().elem::<f32>();
        }
        param
    }
}

/// Multiplies every visited parameter's gradient by `scale`.
struct GradScaler<'a> {
    grads: &'a mut GradientsParams,
    scale: f32,
}

impl<'a, B: AutodiffBackend> ModuleMapper<B> for GradScaler<'a> {
    fn map_float<const D: usize>(&mut self, param: Param<Tensor<B, D>>) -> Param<Tensor<B, D>> {
        if let Some(grad) = self.grads.remove::<B::InnerBackend, D>(param.id.clone()) {
            self.grads
                .register::<B::InnerBackend, D>(param.id.clone(), grad.mul_scalar(self.scale));
        }
        param
    }
}

/// Global L2 norm of the gradients of `model`'s parameters.
pub fn global_grad_norm<B, M>(model: &M, grads: &GradientsParams) -> f32
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let mut accumulator = SquaredNormAccumulator {
        grads,
        sum_squares: 0.0,
    };
    let _ = model.clone().map(&mut accumulator);
    accumulator.sum_squares.sqrt()
}

/// Scale all gradients by `max_norm / (norm + 1e-6)` when their global norm
/// exceeds `max_norm`.
///
/// Returns the norm measured before clipping. A non-finite norm leaves the
/// gradients untouched; the caller decides what to do with it.
pub fn clip_global_grad_norm<B, M>(model: &M, grads: &mut GradientsParams, max_norm: f32) -> f32
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let norm = global_grad_norm::<B, M>(model, grads);
    if norm.is_finite() && norm > max_norm {
        let mut scaler = GradScaler {
            grads,
            scale: max_norm / (norm + CLIP_EPS),
        };
        let _ = model.clone().map(&mut scaler);
    }
    norm
}
