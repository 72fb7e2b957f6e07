/// Fixed-length bitset with one bit per stream channel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelMask {
    words: Vec<u64>,
    len: usize,
}

impl ChannelMask {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns false for out-of-range indices.
    pub fn get(&self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.words[index / 64] & (1 << (index % 64)) != 0
    }

    pub fn set(&mut self, index: usize, value: bool) {
        if index >= self.len {
            return;
        }
        let bit = 1u64 << (index % 64);
        if value {
            self.words[index / 64] |= bit;
        } else {
            self.words[index / 64] &= !bit;
        }
    }

    pub fn set_all(&mut self, value: bool) {
        let fill = if value { u64::MAX } else { 0 };
        self.words.iter_mut().for_each(|word| *word = fill);
        self.clear_tail();
    }

    pub fn clear(&mut self) {
        self.set_all(false);
    }

    pub fn union_with(&mut self, other: &ChannelMask) {
        for (word, other) in self.words.iter_mut().zip(&other.words) {
            *word |= other;
        }
        self.clear_tail();
    }

    pub fn intersect_with(&mut self, other: &ChannelMask) {
        for (word, other) in self.words.iter_mut().zip(&other.words) {
            *word &= other;
        }
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn any(&self) -> bool {
        self.words.iter().any(|word| *word != 0)
    }

    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(|index| self.get(*index))
    }

    fn clear_tail(&mut self) {
        let tail = self.len % 64;
        if tail != 0
            && let Some(last) = self.words.last_mut()
        {
            *last &= (1u64 << tail) - 1;
        }
    }
}
