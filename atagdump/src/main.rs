use std::io::{stdout, Write};

use stemmy::{
    atag::{Cmdline, Core, Initrd, Mem, Record, SerialNr},
    config::{BoardConfig, NR_DRAM_BANKS},
    env::{EnvMap, Environment},
    keys::BoardKeys,
    BootContext, TagKind, TagList,
};

const MACH_UNKNOWN: u32 = 0xffff_ffff;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args();
    args.next(); // Skip the command name
    let atags_name = args.next().expect("an atags file should be provided");
    let copy_name = args.next();

    let bytes = std::fs::read(&atags_name).expect("the atags file should be readable");
    println!("=> Read {} bytes from `{atags_name}`.", bytes.len());

    let list = TagList::new(&bytes);
    for record in list.records() {
        print!(
            "   {:#010x} +{:#06x} {:<10} {:3} words",
            record.tag(),
            record.addr() - list.addr(),
            format!("{:?}", record.kind()),
            record.size_words()
        );
        if let Some(details) = describe(&record) {
            print!("  {details}");
        }
        println!();
    }

    // Run the board hooks the way the bootloader would, minus the keys.
    let mut ctx = BootContext::new(BoardConfig::default());
    ctx.on_handoff(MACH_UNKNOWN, list)
        .expect("a fresh context should accept the hand-off");

    match ctx.dram_init() {
        Ok(total) => println!("=> Total memory: {total:#x} bytes."),
        Err(err) => log::warn!("No memory information, assuming 0 bytes: {err}"),
    }
    if let Ok(banks) = ctx.dram_init_banksize::<NR_DRAM_BANKS>() {
        for (index, bank) in banks.iter().enumerate() {
            println!("   bank {index}: {:#010x}-{:#010x}", bank.start, bank.end());
        }
    }

    let mut env = EnvMap::new();
    ctx.misc_init(&mut BoardKeys::default(), &mut env)
        .expect("the context should be ready for misc_init");
    match env.get(stemmy::env::SERIAL) {
        Some(serial) => println!("=> serial# = {serial}"),
        None => println!("=> No serial number."),
    }

    let Some(filtered) = ctx.filtered() else {
        println!("=> Nothing to pass on to the next stage.");
        return;
    };
    println!("=> {} bytes are passed on to the next stage.", filtered.len());

    match copy_name {
        Some(copy_name) => {
            let mut out = vec![0u8; filtered.len()];
            let written = ctx
                .on_emit(&mut &mut out[..])
                .expect("the buffer should fit the filtered atags");
            std::fs::write(&copy_name, &out[..written]).expect("the copy should be writable");
            println!("=> Wrote the filtered atags to `{copy_name}`.");
        }
        None => log::info!("No copy target given, the filtered atags are not written"),
    }
    stdout().flush().expect("should be able to flush stdout");
}

/// Decoded payload of the record kinds the tool knows about.
fn describe(record: &Record) -> Option<String> {
    let details = match record.kind() {
        TagKind::Core => {
            let core = record.payload::<Core>()?;
            format!(
                "flags {:#x} pagesize {:#x} rootdev {:#x}",
                core.flags, core.pagesize, core.rootdev
            )
        }
        TagKind::Mem => {
            let mem = record.payload::<Mem>()?;
            format!("start {:#010x} size {:#010x}", mem.start, mem.size)
        }
        TagKind::SerialNr => format!("{:016x}", record.payload::<SerialNr>()?.value()),
        TagKind::Initrd | TagKind::Initrd2 => {
            let initrd = record.payload::<Initrd>()?;
            format!("start {:#010x} size {:#x}", initrd.start, initrd.size)
        }
        TagKind::Cmdline => {
            let Cmdline(cmdline) = record.payload::<Cmdline>()?;
            format!("\"{}\"", String::from_utf8_lossy(cmdline))
        }
        _ => return None,
    };
    Some(details)
}
