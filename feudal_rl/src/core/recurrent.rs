//! Single-step LSTM cell used by the manager and worker cores.

use burn::module::Module;
use burn::nn::{Lstm, LstmConfig, LstmState};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// LSTM hidden state (h, c).
#[derive(Debug, Clone)]
pub struct HiddenState<B: Backend> {
    /// Hidden state h [batch, hidden_size]
    pub hidden: Tensor<B, 2>,
    /// Cell state c [batch, hidden_size]
    pub cell: Tensor<B, 2>,
}

impl<B: Backend> HiddenState<B> {
    /// Create a state from its two tensors.
    pub fn new(hidden: Tensor<B, 2>, cell: Tensor<B, 2>) -> Self {
        Self { hidden, cell }
    }

    /// Zero state.
    pub fn zeros(batch_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            hidden: Tensor::zeros([batch_size, hidden_size], device),
            cell: Tensor::zeros([batch_size, hidden_size], device),
        }
    }

    /// Keep the values, drop the autodiff history.
    pub fn detach(self) -> Self {
        Self {
            hidden: self.hidden.detach(),
            cell: self.cell.detach(),
        }
    }
}

/// Configuration for [`LstmCell`].
#[derive(Debug, Clone)]
pub struct LstmCellConfig {
    /// Input feature size.
    pub d_input: usize,
    /// Hidden state size.
    pub d_hidden: usize,
}

impl LstmCellConfig {
    /// Create new LSTM config.
    pub fn new(d_input: usize, d_hidden: usize) -> Self {
        Self { d_input, d_hidden }
    }

    /// Initialize the cell.
    pub fn init<B: Backend>(&self, device: &B::Device) -> LstmCell<B> {
        LstmCell {
            lstm: LstmConfig::new(self.d_input, self.d_hidden, true).init(device),
            d_input: self.d_input,
            d_hidden: self.d_hidden,
        }
    }
}

/// Burn's sequence `Lstm` driven one timestep at a time.
#[derive(Module, Debug)]
pub struct LstmCell<B: Backend> {
    lstm: Lstm<B>,
    #[module(skip)]
    d_input: usize,
    #[module(skip)]
    d_hidden: usize,
}

impl<B: Backend> LstmCell<B> {
    /// Process a single timestep.
    ///
    /// # Arguments
    /// * `input` - Input tensor [batch, d_input]
    /// * `state` - Current hidden state
    ///
    /// # Returns
    /// * `output` - h of the new state [batch, d_hidden]
    /// * `new_state` - Updated hidden state
    pub fn step(&self, input: Tensor<B, 2>, state: HiddenState<B>) -> (Tensor<B, 2>, HiddenState<B>) {
        let [batch_size, _] = input.dims();
        let input_seq = input.reshape([batch_size, 1, self.d_input]);

        let lstm_state = LstmState::new(state.cell, state.hidden);
        let (output_seq, new_state) = self.lstm.forward(input_seq, Some(lstm_state));

        let output = output_seq.reshape([batch_size, self.d_hidden]);
        (output, HiddenState::new(new_state.hidden, new_state.cell))
    }

    /// Zero state for `batch_size` sequences.
    pub fn initial_state(&self, batch_size: usize, device: &B::Device) -> HiddenState<B> {
        HiddenState::zeros(batch_size, self.d_hidden, device)
    }
}
