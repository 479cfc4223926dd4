/// Number of times an instruction type was seen by block generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstructionUsage {
    pub name: &'static str,
    pub count: u64,
}
