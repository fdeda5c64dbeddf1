use serde::{Deserialize, Serialize};

/// Defines the method to integrate the elastoplastic rate equations
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum IntegrationMethod {
    /// Implicit return mapping (closest point projection) solved by Newton's method
    BackwardEuler,

    /// Explicit integration with the continuum elastoplastic modulus and drift correction
    ForwardEuler,

    /// Explicit second-order integration with local error control and drift correction
    ModifiedEuler,
}

/// Defines the stiffness tensor returned by the material point
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum TangentType {
    /// Elastic modulus Dₑ
    Elastic,

    /// Continuum elastoplastic modulus Dₑₚ evaluated at the final state
    Continuum,

    /// Algorithmic (consistent) modulus dσ/dε of the integration scheme
    Algorithmic,
}

impl IntegrationMethod {
    /// Indicates whether the method is explicit or not
    pub fn explicit(&self) -> bool {
        match self {
            IntegrationMethod::BackwardEuler => false,
            IntegrationMethod::ForwardEuler => true,
            IntegrationMethod::ModifiedEuler => true,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{IntegrationMethod, TangentType};

    #[test]
    fn derive_works() {
        let method = IntegrationMethod::ModifiedEuler;
        let clone = method.clone();
        assert_eq!(format!("{:?}", clone), "ModifiedEuler");
        let tangent = TangentType::Algorithmic;
        assert_eq!(tangent, TangentType::Algorithmic);
    }

    #[test]
    fn explicit_works() {
        assert_eq!(IntegrationMethod::BackwardEuler.explicit(), false);
        assert_eq!(IntegrationMethod::ForwardEuler.explicit(), true);
        assert_eq!(IntegrationMethod::ModifiedEuler.explicit(), true);
    }

    #[test]
    fn serialize_works() {
        let json = serde_json::to_string(&IntegrationMethod::BackwardEuler).unwrap();
        assert_eq!(json, "\"BackwardEuler\"");
        let read: TangentType = serde_json::from_str("\"Continuum\"").unwrap();
        assert_eq!(read, TangentType::Continuum);
    }
}
