/// Configuration options supplied when opening a [`super::RecordStore`].
#[derive(Clone, Debug)]
pub struct StoreOptions {
    /// Create an empty store when the directory holds none.
    pub create_if_missing: bool,
    /// Reject every write; nothing is flushed on close.
    pub read_only: bool,
    /// Seed a freshly created store with the reference node `0`.
    pub reference_node: bool,
    /// Fsync store files when they are written out.
    pub sync_on_close: bool,
    /// Remove an existing store directory before opening.
    pub truncate: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            read_only: false,
            reference_node: true,
            sync_on_close: false,
            truncate: false,
        }
    }
}

impl StoreOptions {
    /// Options for the bulk-load phase.
    pub fn for_insert() -> Self {
        Self::default()
    }

    /// Options for the traversal phase: the store must exist and stays untouched.
    pub fn for_read() -> Self {
        Self {
            create_if_missing: false,
            read_only: true,
            ..Self::default()
        }
    }

    /// Enables or disables seeding the reference node on creation.
    pub fn reference_node(mut self, enabled: bool) -> Self {
        self.reference_node = enabled;
        self
    }

    /// Enables or disables fsync when store files are written.
    pub fn sync_on_close(mut self, enabled: bool) -> Self {
        self.sync_on_close = enabled;
        self
    }

    /// Enables or disables wiping an existing store before loading.
    pub fn truncate(mut self, enabled: bool) -> Self {
        self.truncate = enabled;
        self
    }
}
