//! Memory Manager: owns guest globals and fixed-capacity arrays.
//! Arena-style storage — a dense array of slots keyed by a small integer
//! id, no cross-references, no nested structures.

pub const MAX_GLOBALS: usize = 64;
pub const MAX_ARRAYS: usize = 16;
pub const MAX_ARRAY_ELEMENTS: usize = 64;

struct ArraySlot {
    id: u8,
    len: usize,
    elements: [i32; MAX_ARRAY_ELEMENTS],
}

/// Owns globals and arrays. Has no knowledge of the operand stack or PC —
/// every failure is reported as `false`/`MemoryBounds`, never a VM abort.
pub struct MemoryManager {
    globals: [i32; MAX_GLOBALS],
    arrays: Vec<ArraySlot>,
}

impl MemoryManager {
    pub fn new() -> Self {
        Self {
            globals: [0; MAX_GLOBALS],
            arrays: Vec::with_capacity(MAX_ARRAYS),
        }
    }

    pub fn reset(&mut self) {
        self.globals = [0; MAX_GLOBALS];
        self.arrays.clear();
    }

    pub fn load_global(&self, id: u8) -> Result<i32, ()> {
        self.globals.get(id as usize).copied().ok_or(())
    }

    pub fn store_global(&mut self, id: u8, value: i32) -> Result<(), ()> {
        match self.globals.get_mut(id as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(()),
        }
    }

    fn find_array(&self, id: u8) -> Option<&ArraySlot> {
        self.arrays.iter().find(|a| a.id == id)
    }

    fn find_array_mut(&mut self, id: u8) -> Option<&mut ArraySlot> {
        self.arrays.iter_mut().find(|a| a.id == id)
    }

    /// Create an array with `size` elements, zero-initialized. Fails if the
    /// id already exists, the workspace is full, or size exceeds capacity.
    pub fn create_array(&mut self, id: u8, size: usize) -> Result<(), ()> {
        if size == 0 || size > MAX_ARRAY_ELEMENTS {
            return Err(());
        }
        if self.find_array(id).is_some() {
            return Err(());
        }
        if self.arrays.len() >= MAX_ARRAYS {
            return Err(());
        }
        self.arrays.push(ArraySlot {
            id,
            len: size,
            elements: [0; MAX_ARRAY_ELEMENTS],
        });
        Ok(())
    }

    pub fn get_array_size(&self, id: u8) -> Result<u16, ()> {
        self.find_array(id).map(|a| a.len as u16).ok_or(())
    }

    pub fn load_array_element(&self, id: u8, index: usize) -> Result<i32, ()> {
        let array = self.find_array(id).ok_or(())?;
        if index >= array.len {
            return Err(());
        }
        Ok(array.elements[index])
    }

    pub fn store_array_element(&mut self, id: u8, index: usize, value: i32) -> Result<(), ()> {
        let array = self.find_array_mut(id).ok_or(())?;
        if index >= array.len {
            return Err(());
        }
        array.elements[index] = value;
        Ok(())
    }
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_round_trip_within_capacity() {
        let mut mm = MemoryManager::new();
        mm.store_global(10, 99).unwrap();
        assert_eq!(mm.load_global(10).unwrap(), 99);
    }

    #[test]
    fn global_out_of_range_fails() {
        let mut mm = MemoryManager::new();
        assert!(mm.store_global(64, 1).is_err());
        assert!(mm.load_global(64).is_err());
    }

    #[test]
    fn uninitialized_global_reads_zero() {
        let mm = MemoryManager::new();
        assert_eq!(mm.load_global(5).unwrap(), 0);
    }

    #[test]
    fn array_round_trip() {
        let mut mm = MemoryManager::new();
        mm.create_array(0, 4).unwrap();
        mm.store_array_element(0, 0, 5).unwrap();
        assert_eq!(mm.load_array_element(0, 0).unwrap(), 5);
    }

    #[test]
    fn array_bounds_checked_against_recorded_size_not_capacity() {
        let mut mm = MemoryManager::new();
        mm.create_array(0, 4).unwrap();
        assert!(mm.store_array_element(0, 4, 1).is_err());
        assert!(mm.load_array_element(0, 4).is_err());
    }

    #[test]
    fn duplicate_array_id_fails() {
        let mut mm = MemoryManager::new();
        mm.create_array(2, 8).unwrap();
        assert!(mm.create_array(2, 8).is_err());
    }

    #[test]
    fn array_size_over_capacity_fails() {
        let mut mm = MemoryManager::new();
        assert!(mm.create_array(0, MAX_ARRAY_ELEMENTS + 1).is_err());
    }

    #[test]
    fn reset_clears_globals_and_arrays() {
        let mut mm = MemoryManager::new();
        mm.store_global(0, 7).unwrap();
        mm.create_array(0, 4).unwrap();
        mm.reset();
        assert_eq!(mm.load_global(0).unwrap(), 0);
        assert!(mm.get_array_size(0).is_err());
    }
}
