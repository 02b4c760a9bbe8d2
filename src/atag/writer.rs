use crate::{eio, Error};

use super::{Core, Initrd, Mem, Record, SerialNr, TagKind, HEADER_SIZE, HEADER_WORDS};

/// Writes ATAG records into an [`eio::Write`] sink.
///
/// This is what the boot path uses to assemble the list handed to the next stage: an
/// `ATAG_CORE`, the board records, the ramdisk location, and the terminator. Every method returns
/// the number of bytes it wrote. If the sink fills up, [`Error::OutputFull`] is returned and the
/// sink may hold the start of the record that did not fit.
pub struct TagWriter<W> {
    sink: W,
    written: usize,
}

impl<W: eio::Write> TagWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, written: 0 }
    }

    /// Total number of bytes written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.sink
            .write_all(bytes)
            .map_err(|_| Error::OutputFull {
                needed: bytes.len(),
            })?;
        self.written += bytes.len();
        Ok(())
    }

    fn header(&mut self, tag: u32, payload_words: u32) -> Result<(), Error> {
        self.put(&(HEADER_WORDS + payload_words).to_ne_bytes())?;
        self.put(&tag.to_ne_bytes())
    }

    fn words(&mut self, tag: u32, words: &[u32]) -> Result<usize, Error> {
        self.header(tag, words.len() as u32)?;
        for word in words {
            self.put(&word.to_ne_bytes())?;
        }
        Ok(HEADER_SIZE + words.len() * 4)
    }

    /// `ATAG_CORE`. Must be the first record of a list.
    pub fn core(&mut self, core: Core) -> Result<usize, Error> {
        self.words(TagKind::ATAG_CORE, &[core.flags, core.pagesize, core.rootdev])
    }

    pub fn mem(&mut self, mem: Mem) -> Result<usize, Error> {
        self.words(TagKind::ATAG_MEM, &[mem.size, mem.start])
    }

    pub fn serial(&mut self, serial: SerialNr) -> Result<usize, Error> {
        self.words(TagKind::ATAG_SERIAL, &[serial.low, serial.high])
    }

    /// `ATAG_INITRD2`, with a physical start address.
    pub fn initrd2(&mut self, initrd: Initrd) -> Result<usize, Error> {
        self.words(TagKind::ATAG_INITRD2, &[initrd.start, initrd.size])
    }

    /// `ATAG_CMDLINE`. A NUL terminator is appended and the record padded to a whole word.
    pub fn cmdline(&mut self, cmdline: &[u8]) -> Result<usize, Error> {
        let payload_words = (cmdline.len() + 1).div_ceil(4);
        self.header(TagKind::ATAG_CMDLINE, payload_words as u32)?;
        self.put(cmdline)?;
        let padding = payload_words * 4 - cmdline.len();
        self.put(&[0u8; 4][..padding])?;
        Ok(HEADER_SIZE + payload_words * 4)
    }

    /// Copy a record verbatim.
    pub fn record(&mut self, record: &Record<'_>) -> Result<usize, Error> {
        self.bytes(record.as_bytes())
    }

    /// Copy already encoded records, e.g. a filtered list.
    pub fn bytes(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        self.put(bytes)?;
        Ok(bytes.len())
    }

    /// The `ATAG_NONE` terminator.
    pub fn end(&mut self) -> Result<usize, Error> {
        self.words(TagKind::ATAG_NONE, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atag::{tests::build, Cmdline, TagList};

    #[test]
    fn written_list_parses_back() {
        let mut buf = [0u8; 128];
        let mut writer = TagWriter::new(&mut buf[..]);
        writer.core(Core::default()).unwrap();
        writer
            .mem(Mem {
                size: 0x2000_0000,
                start: 0x8000_0000,
            })
            .unwrap();
        writer.cmdline(b"root=/dev/ram0").unwrap();
        writer.end().unwrap();
        let used = writer.written();

        let expected_cmdline_words = (14 + 1 + 3) / 4;
        assert_eq!(used, 20 + 16 + 8 + expected_cmdline_words * 4 + 8);

        let list = TagList::new(&buf[..used]);
        let kinds: alloc::vec::Vec<_> = list.records().map(|r| r.kind()).collect();
        assert_eq!(kinds, [TagKind::Core, TagKind::Mem, TagKind::Cmdline]);
        let cmdline = list.records().nth(2).unwrap();
        assert_eq!(cmdline.payload::<Cmdline>(), Some(Cmdline(b"root=/dev/ram0")));
    }

    #[test]
    fn records_copy_verbatim() {
        let source = build(&[(0x4d53_4d70, &[1, 2, 3])]);
        let record = TagList::new(&source).records().next().unwrap();

        let mut buf = [0u8; 32];
        let mut writer = TagWriter::new(&mut buf[..]);
        assert_eq!(writer.record(&record), Ok(20));
        assert_eq!(&buf[..20], &source[..]);
    }

    #[test]
    fn full_sink_is_reported() {
        let mut buf = [0u8; 12];
        let mut writer = TagWriter::new(&mut buf[..]);
        assert!(matches!(
            writer.mem(Mem { size: 1, start: 2 }),
            Err(Error::OutputFull { .. })
        ));
    }
}
