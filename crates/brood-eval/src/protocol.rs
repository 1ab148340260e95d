use brood_core::Result;
use brood_error::brood_err;

/// Request opcodes, one byte on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Shutdown = 0,
    EvaluateSimple = 1,
    EvaluateGrouped = 2,
    Checkpoint = 3,
}

impl Opcode {
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(Opcode::Shutdown),
            1 => Ok(Opcode::EvaluateSimple),
            2 => Ok(Opcode::EvaluateGrouped),
            3 => Ok(Opcode::Checkpoint),
            other => Err(brood_err!(Protocol: "unknown opcode {}", other)),
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Per-individual result markers sent back by the slave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ResultKind {
    Nothing = 0,
    Individual = 1,
    Fitness = 2,
}

impl ResultKind {
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(ResultKind::Nothing),
            1 => Ok(ResultKind::Individual),
            2 => Ok(ResultKind::Fitness),
            other => Err(brood_err!(Protocol: "unknown result marker {}", other)),
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_round_trip() {
        for opcode in [
            Opcode::Shutdown,
            Opcode::EvaluateSimple,
            Opcode::EvaluateGrouped,
            Opcode::Checkpoint,
        ] {
            assert_eq!(Opcode::from_byte(opcode.as_byte()).unwrap(), opcode);
        }
        assert!(Opcode::from_byte(17).is_err());
    }

    #[test]
    fn test_result_kind_round_trip() {
        for kind in [ResultKind::Nothing, ResultKind::Individual, ResultKind::Fitness] {
            assert_eq!(ResultKind::from_byte(kind.as_byte()).unwrap(), kind);
        }
        assert!(ResultKind::from_byte(9).is_err());
    }
}
