use std::cell::RefCell;
use std::rc::Rc;

use ndarray::Array1;

use crate::Float;

#[derive(Debug)]
struct VariableData<F> {
    len: usize,
    value: RefCell<Option<Array1<F>>>,
}

/// The decision variable of an optimization problem: a vector of unknowns
/// whose value is filled in by a successful solve.
#[derive(Debug, Clone)]
pub struct Variable<F> {
    data: Rc<VariableData<F>>,
}

impl<F: Float> Variable<F> {
    pub fn new(len: usize) -> Self {
        Variable {
            data: Rc::new(VariableData {
                len,
                value: RefCell::new(None),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len
    }

    pub fn is_empty(&self) -> bool {
        self.data.len == 0
    }

    /// The value found by the last successful solve, if any.
    pub fn value(&self) -> Option<Array1<F>> {
        self.data.value.borrow().clone()
    }

    pub(crate) fn set_value(&self, value: Array1<F>) {
        debug_assert_eq!(value.len(), self.data.len);
        *self.data.value.borrow_mut() = Some(value);
    }

    /// Whether both handles refer to the same variable.
    pub fn same_as(&self, other: &Variable<F>) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}
