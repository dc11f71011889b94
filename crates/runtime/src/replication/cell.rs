/// A value paired with the version of its latest write.
///
/// On the server every write bumps the version, even when the value is
/// unchanged. Replicas use [`ReplicatedCell::merge`], which ignores anything
/// not strictly newer than what they already hold.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplicatedCell<T> {
    value: T,
    version: u64,
}

impl<T> ReplicatedCell<T> {
    pub fn new(value: T) -> Self {
        Self::at(value, 1)
    }

    pub fn at(value: T, version: u64) -> Self {
        Self { value, version }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Authoritative write; returns the new version.
    pub fn set(&mut self, value: T) -> u64 {
        self.value = value;
        self.version += 1;
        self.version
    }

    /// Applies a remote write if it is newer than the held one.
    pub fn merge(&mut self, value: T, version: u64) -> bool {
        if version <= self.version {
            return false;
        }
        self.value = value;
        self.version = version;
        true
    }
}
