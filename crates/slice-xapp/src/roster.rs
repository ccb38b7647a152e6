//! Static slice and UE roster for the controlled cell.
//!
//! UEs are assigned to exactly one slice for the lifetime of the process.
//! The live UE total comes from the KPM subscription each cycle; the roster
//! bounds how many control requests a slice can receive.

use serde::{Deserialize, Serialize};

/// Slice differentiator for slice A
pub const SLICE_A_SD: u32 = 16_777_210;
/// Slice differentiator for slice B
pub const SLICE_B_SD: u32 = 16_777_215;
/// Slice/service type shared by both slices
pub const DEFAULT_SST: u8 = 1;

/// One end-user device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ue {
    pub id: u32,
    pub sst: u8,
    pub sd: u32,
}

/// A named logical partition of the cell's PRB capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    pub name: String,
    pub sst: u8,
    pub sd: u32,
}

/// The two equal-priority slices and their UE memberships.
#[derive(Debug, Clone)]
pub struct Roster {
    pub slices: Vec<Slice>,
    pub slice_a_ues: Vec<Ue>,
    pub slice_b_ues: Vec<Ue>,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            slices: vec![
                Slice {
                    name: "A".to_string(),
                    sst: DEFAULT_SST,
                    sd: SLICE_A_SD,
                },
                Slice {
                    name: "B".to_string(),
                    sst: DEFAULT_SST,
                    sd: SLICE_B_SD,
                },
            ],
            slice_a_ues: vec![
                Ue {
                    id: 0,
                    sst: DEFAULT_SST,
                    sd: SLICE_A_SD,
                },
                Ue {
                    id: 2,
                    sst: DEFAULT_SST,
                    sd: SLICE_A_SD,
                },
            ],
            slice_b_ues: vec![Ue {
                id: 1,
                sst: DEFAULT_SST,
                sd: SLICE_B_SD,
            }],
        }
    }
}

impl Roster {
    /// Total number of rostered UEs across both slices.
    pub fn total_ues(&self) -> u32 {
        (self.slice_a_ues.len() + self.slice_b_ues.len()) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster_counts() {
        let roster = Roster::default();
        assert_eq!(roster.total_ues(), 3);
        assert_eq!(roster.slice_a_ues.len(), 2);
        assert_eq!(roster.slice_b_ues.len(), 1);
    }

    #[test]
    fn test_ues_carry_their_slice_identity() {
        let roster = Roster::default();
        assert!(roster.slice_a_ues.iter().all(|ue| ue.sd == SLICE_A_SD));
        assert!(roster.slice_b_ues.iter().all(|ue| ue.sd == SLICE_B_SD));
    }
}
