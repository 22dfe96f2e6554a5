use alloy_primitives::Address;

/// Wallet connection as seen by the rest of the client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSession {
    address: Option<Address>,
}

impl WalletSession {
    /// A session with no connected account
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// A session connected with the given account
    pub fn connected(address: Address) -> Self {
        Self {
            address: Some(address),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    /// Active account, if any
    pub fn address(&self) -> Option<Address> {
        self.address
    }

    pub fn connect(&mut self, address: Address) {
        self.address = Some(address);
    }

    pub fn disconnect(&mut self) {
        self.address = None;
    }
}
