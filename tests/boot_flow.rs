use std::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin};
use stemmy::{
    atag::{Core, Initrd, Mem, SerialNr, TagWriter},
    board::Phase,
    config::{BoardConfig, NR_DRAM_BANKS},
    env::{self, EnvMap, Environment},
    handoff::{self, Handoff},
    keys::{BootMode, Key, KeyProvider},
    BootContext, Error, TagKind, TagList,
};

const MACH_U8500: u32 = 0x0eb1;
const VENDOR_TAG: u32 = 0x4d53_4d70;

/// The list a stemmy primary bootloader typically leaves behind.
fn vendor_atags() -> Vec<u8> {
    let mut buf = [0u8; 256];
    let mut writer = TagWriter::new(&mut buf[..]);
    writer
        .core(Core {
            flags: 1,
            pagesize: 4096,
            rootdev: 0,
        })
        .unwrap();
    writer
        .mem(Mem {
            size: 0x1000_0000,
            start: 0x0000_0000,
        })
        .unwrap();
    writer
        .mem(Mem {
            size: 0x1000_0000,
            start: 0x1000_0000,
        })
        .unwrap();
    writer.cmdline(b"console=ttySAC2,115200").unwrap();
    writer
        .serial(SerialNr {
            low: 0x2,
            high: 0x1,
        })
        .unwrap();
    writer
        .initrd2(Initrd {
            start: 0x0100_0000,
            size: 0x0010_0000,
        })
        .unwrap();
    writer.bytes(&VENDOR_TAG_RECORD).unwrap();
    writer.end().unwrap();
    let used = writer.written();
    buf[..used].to_vec()
}

const VENDOR_TAG_RECORD: [u8; 12] = {
    let size = 3u32.to_ne_bytes();
    let tag = VENDOR_TAG.to_ne_bytes();
    let value = 0x5a5a_a5a5u32.to_ne_bytes();
    [
        size[0], size[1], size[2], size[3], tag[0], tag[1], tag[2], tag[3], value[0], value[1],
        value[2], value[3],
    ]
};

struct Level(bool);

impl ErrorType for Level {
    type Error = Infallible;
}

impl InputPin for Level {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0)
    }
}

/// Volume-up pressed, volume-down not described by the board.
struct RecoveryKeys;

impl KeyProvider for RecoveryKeys {
    type Pin = Level;

    fn request(&mut self, key: Key) -> Result<Self::Pin, Error> {
        match key {
            Key::VolumeUp => Ok(Level(true)),
            Key::VolumeDown => Err(Error::MissingConfig(key)),
        }
    }
}

#[test]
fn full_boot_sequence() {
    let atags = vendor_atags();
    let mut ctx = BootContext::new(BoardConfig::default());
    ctx.on_handoff(MACH_U8500, TagList::new(&atags)).unwrap();

    assert_eq!(ctx.dram_init(), Ok(0x2000_0000));
    let banks = ctx.dram_init_banksize::<NR_DRAM_BANKS>().unwrap();
    assert_eq!(banks.len(), 2);
    assert_eq!(banks[1].start, 0x1000_0000);

    let info = ctx.board_init();
    assert_eq!(info.arch_number, MACH_U8500);
    assert_eq!(info.boot_params, atags.as_ptr() as usize);

    let mut env = EnvMap::new();
    env.set(env::BOOTCMD, "run mmcboot");
    let mode = ctx.misc_init(&mut RecoveryKeys, &mut env).unwrap();
    assert_eq!(mode, BootMode::RECOVERY);
    assert_eq!(env.get(env::SERIAL), Some("0000000100000002"));
    assert_eq!(env.get(env::BOOTCMD), Some("run recoverybootcmd"));
    assert_eq!(env.get(env::PREBOOT), None);

    // What the bootloader hands to an ATAG kernel: a new header, the board records, the ramdisk
    // it loaded itself, and the terminator.
    let mut buf = [0u8; 512];
    let mut cursor = &mut buf[..];
    TagWriter::new(&mut cursor).core(Core::default()).unwrap();
    let emitted = ctx.on_emit(&mut cursor).unwrap();
    {
        let mut writer = TagWriter::new(&mut cursor);
        writer
            .initrd2(Initrd {
                start: 0x0200_0000,
                size: 0x0008_0000,
            })
            .unwrap();
        writer.end().unwrap();
    }
    let remaining = cursor.len();
    let used = buf.len() - remaining;
    assert_eq!(ctx.phase(), Phase::Emitted);

    let outgoing = TagList::new(&buf[..used]);
    let kinds: Vec<_> = outgoing.records().map(|r| r.kind()).collect();
    assert_eq!(
        kinds,
        [
            TagKind::Core,
            TagKind::Mem,
            TagKind::Mem,
            TagKind::Cmdline,
            TagKind::SerialNr,
            TagKind::Unknown(VENDOR_TAG),
            TagKind::Initrd2,
        ]
    );
    assert_eq!(emitted, ctx.filtered().unwrap().len());

    let initrds: Vec<_> = outgoing
        .records()
        .filter_map(|r| r.payload::<Initrd>())
        .collect();
    assert_eq!(
        initrds,
        [Initrd {
            start: 0x0200_0000,
            size: 0x0008_0000
        }]
    );
}

#[test]
fn serial_already_in_environment_is_kept() {
    let atags = vendor_atags();
    let mut ctx = BootContext::new(BoardConfig::default());
    ctx.on_handoff(MACH_U8500, TagList::new(&atags)).unwrap();

    let mut env = EnvMap::new();
    env.set(env::SERIAL, "0123456789abcdef");
    ctx.misc_init(&mut RecoveryKeys, &mut env).unwrap();
    assert_eq!(env.get(env::SERIAL), Some("0123456789abcdef"));
    // The record itself still goes to the next stage.
    assert!(ctx
        .filtered()
        .unwrap()
        .tags()
        .records()
        .any(|r| r.kind() == TagKind::SerialNr));
}

#[test]
fn boot_from_saved_registers() {
    let atags: &'static [u8] = Box::leak(vendor_atags().into_boxed_slice());
    handoff::save_boot_params(0, MACH_U8500 as usize, atags.as_ptr() as usize, 0);

    let saved = handoff::saved().unwrap();
    assert_eq!(
        saved,
        Handoff {
            machine_id: MACH_U8500,
            atags: atags.as_ptr() as usize
        }
    );

    let config = BoardConfig {
        atags_limit: atags.len(),
        ..BoardConfig::default()
    };
    // Safety: The list is leaked, so it stays readable and unchanged for the rest of the test.
    let ctx = unsafe { BootContext::from_handoff(saved, config) };
    assert_eq!(ctx.phase(), Phase::RawCaptured);
    assert_eq!(ctx.dram_init(), Ok(0x2000_0000));
}
