//! Canonical and caller-defined reordering of inputs and outputs.
//!
//! Permutations are expressed as a `Vec<usize>` of original positions, so a
//! caller-supplied order can be checked to contain every element exactly
//! once before anything moves.

use rand::seq::SliceRandom;
use tracing::debug;

use crate::input::Input;
use crate::output::Output;
use crate::transaction::Transaction;
use crate::TransactionError;

impl Transaction {
    /// Sort inputs by previous tx id then output index, and outputs by
    /// amount then script bytes.
    ///
    /// Ids compare in display order. Sorting twice is a no-op.
    pub fn sort(&mut self) -> Result<&mut Self, TransactionError> {
        self.sort_inputs(|inputs| {
            let mut order: Vec<usize> = (0..inputs.len()).collect();
            order.sort_by(|&a, &b| {
                let (a, b) = (&inputs[a], &inputs[b]);
                a.prev_tx_id
                    .to_display_bytes()
                    .cmp(&b.prev_tx_id.to_display_bytes())
                    .then(a.output_index.cmp(&b.output_index))
            });
            order
        })?;
        self.sort_outputs(|outputs| {
            let mut order: Vec<usize> = (0..outputs.len()).collect();
            order.sort_by(|&a, &b| {
                let (a, b) = (&outputs[a], &outputs[b]);
                a.satoshis
                    .cmp(&b.satoshis)
                    .then_with(|| a.script.to_bytes().cmp(b.script.to_bytes()))
            });
            order
        })
    }

    /// Put the outputs in a uniformly random order.
    pub fn shuffle_outputs(&mut self) -> Result<&mut Self, TransactionError> {
        self.sort_outputs(|outputs| {
            let mut order: Vec<usize> = (0..outputs.len()).collect();
            order.shuffle(&mut rand::thread_rng());
            order
        })
    }

    /// Reorder inputs by the permutation `f` returns. Clears signatures.
    pub fn sort_inputs<F>(&mut self, f: F) -> Result<&mut Self, TransactionError>
    where
        F: FnOnce(&[Input]) -> Vec<usize>,
    {
        let order = f(&self.inputs);
        check_permutation(&order, self.inputs.len())?;
        self.inputs = take_in_order(std::mem::take(&mut self.inputs), &order);
        debug!(?order, "reordered inputs");
        self.clear_signatures()?;
        Ok(self)
    }

    /// Reorder outputs by the permutation `f` returns. The change index
    /// follows the change output. Clears signatures.
    pub fn sort_outputs<F>(&mut self, f: F) -> Result<&mut Self, TransactionError>
    where
        F: FnOnce(&[Output]) -> Vec<usize>,
    {
        let order = f(&self.outputs);
        self.new_output_order(&order)?;
        self.clear_signatures()?;
        Ok(self)
    }

    fn new_output_order(&mut self, order: &[usize]) -> Result<(), TransactionError> {
        check_permutation(order, self.outputs.len())?;
        if let Some(change) = self.change_index {
            self.change_index = order.iter().position(|&i| i == change);
        }
        self.outputs = take_in_order(std::mem::take(&mut self.outputs), order);
        debug!(?order, change_index = ?self.change_index, "reordered outputs");
        Ok(())
    }
}

fn check_permutation(order: &[usize], len: usize) -> Result<(), TransactionError> {
    if order.len() != len {
        return Err(TransactionError::InvalidSorting(format!(
            "expected {} elements, got {}",
            len,
            order.len()
        )));
    }
    let mut seen = vec![false; len];
    for &i in order {
        match seen.get_mut(i) {
            Some(slot) if !*slot => *slot = true,
            Some(_) => {
                return Err(TransactionError::InvalidSorting(format!(
                    "index {} appears more than once",
                    i
                )))
            }
            None => {
                return Err(TransactionError::InvalidSorting(format!(
                    "index {} out of range",
                    i
                )))
            }
        }
    }
    Ok(())
}

/// `items` rearranged so position `k` holds the element originally at
/// `order[k]`. `order` must be a valid permutation.
fn take_in_order<T>(items: Vec<T>, order: &[usize]) -> Vec<T> {
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    order.iter().filter_map(|&i| slots[i].take()).collect()
}
