/// 固定容量的环形缓冲区，容量为0时丢弃所有写入
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buf: Vec<T>,
    read: usize,
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    pub fn new(size: usize) -> Self {
        RingBuffer {
            buf: vec![T::default(); size],
            read: 0,
            len: 0,
        }
    }

    #[inline(always)]
    fn slot(&self, offset: usize) -> usize {
        (self.read + offset) % self.buf.len()
    }

    /// 满时覆盖最旧的元素
    pub fn push_overwrite(&mut self, item: T) {
        if self.buf.is_empty() {
            return;
        }
        if self.is_full() {
            self.buf[self.read] = item;
            self.read = self.slot(1);
        } else {
            let write = self.slot(self.len);
            self.buf[write] = item;
            self.len += 1;
        }
    }

    /// 从旧到新遍历，不消耗元素
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).map(move |i| &self.buf[self.slot(i)])
    }

    pub fn clear(&mut self) {
        self.read = 0;
        self.len = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.buf.len()
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }
}
