use crate::GROUP_SIZE;

/// The channel currently routed to the audio output.
///
/// `group` and `offset` are always derived from `global`, never set
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelSelection {
    global: usize,
    group: usize,
    offset: usize,
}

impl ChannelSelection {
    pub const fn new(global: usize) -> Self {
        Self {
            global,
            group: global / GROUP_SIZE,
            offset: global % GROUP_SIZE,
        }
    }

    pub const fn global(&self) -> usize {
        self.global
    }

    /// Hardware group (chip) carrying the channel.
    pub const fn group(&self) -> usize {
        self.group
    }

    /// Position of the channel inside its group's frame.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Moves the selection to `global`. Returns the new group when it
    /// differs from the previous one.
    pub fn select(&mut self, global: usize) -> Option<usize> {
        let previous = self.group;
        *self = Self::new(global);
        (self.group != previous).then_some(self.group)
    }
}
