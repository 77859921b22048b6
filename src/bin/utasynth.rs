// utau-synth -- pitch curve and render argument synthesis for UTAU voicebanks
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! `utasynth` turns a note sketch into a script rendering it with an UTAU resampler and wavtool.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use log::info;
use simple_logger;
use structopt::StructOpt;

use utau_synth::genon::GenonSettings;
use utau_synth::note::{Note, DEFAULT_TEMPO};
use utau_synth::output::script::{RenderScript, ScriptStyle};
use utau_synth::pitch::PitchEncoding;
use utau_synth::sketch::parse_sketch;
use utau_synth::synth::{NoteList, Synth, SynthConfig};

#[derive(Debug, StructOpt)]
#[structopt(name = "utasynth", about = "Rendering note sketches with UTAU tools")]
struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// The note sketch to render.
    #[structopt(parse(from_os_str))]
    source: PathBuf,

    /// Where to write the render script. Printed to stdout if not given.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Write a Windows batch file instead of a shell script.
    #[structopt(long)]
    batch: bool,

    /// Tempo until the first note that changes it.
    #[structopt(long, default_value = "120")]
    tempo: f64,

    /// Resampler flags applied to every note.
    #[structopt(long, default_value = "")]
    flags: String,

    /// Pass pitch bends as plain numbers instead of the compact encoding.
    #[structopt(long)]
    legacy_pitch: bool,

    /// The file the wavtool writes.
    #[structopt(long, default_value = "out.wav")]
    out_file: String,

    /// Directory containing one `<lyric>.wav` sample per lyric.
    #[structopt(long, parse(from_os_str), default_value = ".")]
    voice_dir: PathBuf,

    /// Pre-utterance of every sample in milliseconds.
    #[structopt(long, default_value = "0")]
    preutterance: f64,

    /// Voice overlap of every sample in milliseconds.
    #[structopt(long, default_value = "0")]
    overlap: f64,

    /// Fixed consonant part of every sample in milliseconds.
    #[structopt(long, default_value = "0")]
    consonant: f64,

    /// Offset of every sample in milliseconds.
    #[structopt(long, default_value = "0")]
    offset: f64,

    /// Blank at the end of every sample in milliseconds.
    #[structopt(long, default_value = "0")]
    blank: f64,

    #[structopt(long, default_value = "resampler")]
    resampler: String,

    #[structopt(long, default_value = "wavtool")]
    wavtool: String,
}

fn main() -> io::Result<()> {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(level)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;

    let source = std::fs::read_to_string(&opt.source)?;
    let notes = parse_sketch(&source).map_err(|err| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: {}", opt.source.display(), err),
        )
    })?;
    info!("read {} notes from {}", notes.len(), opt.source.display());

    let genon = |note: &Note| {
        if note.is_rest() {
            return GenonSettings::default();
        }
        GenonSettings {
            file_name: opt
                .voice_dir
                .join(format!("{}.wav", note.lyric))
                .to_string_lossy()
                .into_owned(),
            alias: note.lyric.clone(),
            offset: opt.offset,
            consonant: opt.consonant,
            blank: opt.blank,
            pre_utterance: opt.preutterance,
            voice_overlap: opt.overlap,
        }
    };

    let tempo = if opt.tempo > 0.0 {
        opt.tempo
    } else {
        DEFAULT_TEMPO
    };
    let synth = Synth::new(SynthConfig {
        initial_tempo: tempo,
        global_flags: opt.flags.clone(),
        pitch_encoding: if opt.legacy_pitch {
            PitchEncoding::Legacy
        } else {
            PitchEncoding::Compact
        },
        output_file: opt.out_file.clone(),
    });
    let list = NoteList::new(&notes);
    let rendered = synth.synthesize(list.limits(), list.limits(), &list, &genon);
    info!("synthesized {} notes", rendered.len());

    let style = if opt.batch {
        ScriptStyle::Batch
    } else {
        ScriptStyle::Shell
    };
    let script = RenderScript::new(style, &opt.resampler, &opt.wavtool);
    match &opt.output {
        Some(path) => {
            let mut file = io::BufWriter::new(File::create(path)?);
            script.write(&mut file, &rendered)?;
            file.flush()
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            script.write(&mut lock, &rendered)
        }
    }
}
