use super::{InternalVariableCell, ValueKind};
use crate::tensor::Tensor2;
use crate::StrError;
use std::fmt;

/// Holds the position of one internal variable in the flattened vector of internal values
#[derive(Clone, Debug, PartialEq)]
pub struct VariableEntry {
    /// Name of the variable
    pub name: &'static str,

    /// Name of the hardening law
    pub law: &'static str,

    /// Kind of value
    pub kind: ValueKind,

    /// Index of the first component
    pub offset: usize,

    /// Number of components
    pub len: usize,
}

/// Holds the layout of the flattened vector of internal values
///
/// The order corresponds to the construction order of the variables and never changes.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableLayout {
    entries: Vec<VariableEntry>,
    n_values: usize,
}

impl VariableLayout {
    /// Allocates an empty layout
    pub fn new() -> Self {
        VariableLayout {
            entries: Vec::new(),
            n_values: 0,
        }
    }

    /// Appends a variable at the end of the layout
    pub fn push(&mut self, name: &'static str, law: &'static str, kind: ValueKind, len: usize) {
        self.entries.push(VariableEntry {
            name,
            law,
            kind,
            offset: self.n_values,
            len,
        });
        self.n_values += len;
    }

    /// Returns all entries
    pub fn entries(&self) -> &[VariableEntry] {
        &self.entries
    }

    /// Returns the number of variables
    pub fn n_variables(&self) -> usize {
        self.entries.len()
    }

    /// Returns the total number of internal values
    pub fn n_values(&self) -> usize {
        self.n_values
    }

    /// Finds a variable by name
    pub fn find(&self, name: &str) -> Option<&VariableEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Returns the offset of a variable that must exist with the given kind
    pub fn require(&self, name: &str, kind: ValueKind) -> Result<usize, StrError> {
        match self.find(name) {
            Some(entry) => {
                if entry.kind != kind {
                    return Err("internal variable has an incompatible value type");
                }
                Ok(entry.offset)
            }
            None => Err("required internal variable is missing"),
        }
    }

    /// Returns the offset of a variable that may exist, but must have the given kind if it does
    pub fn optional(&self, name: &str, kind: ValueKind) -> Result<Option<usize>, StrError> {
        match self.find(name) {
            Some(entry) => {
                if entry.kind != kind {
                    return Err("internal variable has an incompatible value type");
                }
                Ok(Some(entry.offset))
            }
            None => Ok(None),
        }
    }

    /// Checks that the names are unique
    pub fn validate(&self) -> Result<(), StrError> {
        for (i, a) in self.entries.iter().enumerate() {
            if self.entries[(i + 1)..].iter().any(|b| b.name == a.name) {
                return Err("internal variable names must be unique");
            }
        }
        Ok(())
    }

    /// Returns a string identifying the variables, their kinds and laws, in order
    pub fn signature(&self) -> String {
        let parts: Vec<_> = self
            .entries
            .iter()
            .map(|e| format!("{}:{}:{}", e.name, e.kind, e.law))
            .collect();
        format!("[{}]", parts.join(","))
    }
}

/// Defines an ordered collection of internal variables
///
/// Implemented for `()` (no internal variables) and for tuples with up to four variables.
/// The order of the tuple determines the layout of the flattened vector of internal values.
pub trait InternalVariableSet: Clone + fmt::Debug + Send + 'static {
    /// Calls `f` on every variable, in order
    fn for_each_cell(&self, f: &mut dyn FnMut(&dyn InternalVariableCell));

    /// Calls `f` on every variable, in order, with mutable access
    fn for_each_cell_mut(&mut self, f: &mut dyn FnMut(&mut dyn InternalVariableCell));

    /// Returns the layout of the flattened vector of internal values
    fn layout(&self) -> VariableLayout {
        let mut layout = VariableLayout::new();
        self.for_each_cell(&mut |cell| layout.push(cell.name(), cell.law_name(), cell.kind(), cell.n_components()));
        layout
    }

    /// Returns the total number of internal values
    fn n_values(&self) -> usize {
        let mut n = 0;
        self.for_each_cell(&mut |cell| n += cell.n_components());
        n
    }

    /// Copies all committed values into a flattened vector
    fn read_committed(&self, values: &mut [f64]) {
        let mut offset = 0;
        self.for_each_cell(&mut |cell| {
            let n = cell.n_components();
            cell.read_committed(&mut values[offset..(offset + n)]);
            offset += n;
        });
    }

    /// Copies all trial values into a flattened vector
    fn read_trial(&self, values: &mut [f64]) {
        let mut offset = 0;
        self.for_each_cell(&mut |cell| {
            let n = cell.n_components();
            cell.read_trial(&mut values[offset..(offset + n)]);
            offset += n;
        });
    }

    /// Sets all trial values from a flattened vector
    fn write_trial(&mut self, values: &[f64]) {
        let mut offset = 0;
        self.for_each_cell_mut(&mut |cell| {
            let n = cell.n_components();
            cell.write_trial(&values[offset..(offset + n)]);
            offset += n;
        });
    }

    /// Sets all committed (and trial) values from a flattened vector
    fn write_committed(&mut self, values: &[f64]) {
        let mut offset = 0;
        self.for_each_cell_mut(&mut |cell| {
            let n = cell.n_components();
            cell.write_committed(&values[offset..(offset + n)]);
            offset += n;
        });
    }

    /// Computes the hardening rates of all variables at the given flattened values
    fn hardening_rates(&self, rates: &mut [f64], values: &[f64], m: &Tensor2, sigma: &Tensor2) {
        let mut offset = 0;
        self.for_each_cell(&mut |cell| {
            let n = cell.n_components();
            let range = offset..(offset + n);
            cell.flat_rate(&values[range.clone()], m, sigma, &mut rates[range]);
            offset += n;
        });
    }

    /// Accepts the trial values of all variables
    fn commit(&mut self) {
        self.for_each_cell_mut(&mut |cell| cell.commit());
    }

    /// Discards the trial values of all variables
    fn revert_to_last_commit(&mut self) {
        self.for_each_cell_mut(&mut |cell| cell.revert_to_last_commit());
    }

    /// Resets all variables to their initial values
    fn revert_to_start(&mut self) {
        self.for_each_cell_mut(&mut |cell| cell.revert_to_start());
    }
}

impl InternalVariableSet for () {
    fn for_each_cell(&self, _f: &mut dyn FnMut(&dyn InternalVariableCell)) {}
    fn for_each_cell_mut(&mut self, _f: &mut dyn FnMut(&mut dyn InternalVariableCell)) {}
}

macro_rules! impl_internal_variable_set {
    ($($var:ident : $idx:tt),+) => {
        impl<$($var),+> InternalVariableSet for ($($var,)+)
        where
            $($var: InternalVariableCell + Clone + Send + 'static),+
        {
            fn for_each_cell(&self, f: &mut dyn FnMut(&dyn InternalVariableCell)) {
                $( f(&self.$idx); )+
            }

            fn for_each_cell_mut(&mut self, f: &mut dyn FnMut(&mut dyn InternalVariableCell)) {
                $( f(&mut self.$idx); )+
            }
        }
    };
}

impl_internal_variable_set!(A: 0);
impl_internal_variable_set!(A: 0, B: 1);
impl_internal_variable_set!(A: 0, B: 1, C: 2);
impl_internal_variable_set!(A: 0, B: 1, C: 2, D: 3);

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
