/// Dialect toggles. Historical interpreters disagree on a handful of
/// instructions; each flag here selects the older behaviour when set.
/// The set is fixed for the life of one interpreter instance.
///
/// The defaults are the modern dialect: shifts operate on Vx alone,
/// Bnnn offsets by V0, Fx1E never touches VF, and Fx55/Fx65 leave the
/// index register where it was.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quirks {
    /// 8xy6 / 8xyE copy Vy into Vx before shifting.
    pub shift_copies_vy: bool,
    /// Bnnn offsets by V[high nibble of nnn] instead of V0.
    pub jump_uses_vx: bool,
    /// Fx1E sets VF when the index register runs past 0x0FFF.
    pub index_add_carry: bool,
    /// Fx55 / Fx65 advance the index register past the copied range.
    pub index_advances: bool,
}
