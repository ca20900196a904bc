/// Which side of the fabric may mutate a component
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Authority {
    #[default]
    NotAuthoritative,
    Authoritative,
    /// Still authoritative, but authority is about to move elsewhere
    AuthorityLossImminent,
}

impl Authority {
    pub fn is_authoritative(&self) -> bool {
        matches!(
            self,
            Authority::Authoritative | Authority::AuthorityLossImminent
        )
    }
}
