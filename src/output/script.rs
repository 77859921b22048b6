// utau-synth -- pitch curve and render argument synthesis for UTAU voicebanks
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Render scripts invoking the resampler and wavtool for every note.
//!
//! Nothing is executed here, the script is only written out.

use std::io;

use log::debug;

use crate::synth::{ResamplerArgs, WavtoolArgs};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScriptStyle {
    /// POSIX shell script.
    Shell,
    /// Windows batch file.
    Batch,
}

/// The tools invoked by a render script.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderScript {
    pub style: ScriptStyle,
    pub resampler: String,
    pub wavtool: String,
}

fn is_shell_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || "_@%+=:,./-".contains(ch)
}

/// Quote an argument for a POSIX shell, leaving simple words untouched.
///
/// ```
/// use utau_synth::output::script::shell_quote;
///
/// assert_eq!(shell_quote("C4"), "C4");
/// assert_eq!(shell_quote(""), "''");
/// assert_eq!(shell_quote("!120"), "'!120'");
/// assert_eq!(shell_quote("it's"), r#"'it'\''s'"#);
/// ```
pub fn shell_quote(arg: &str) -> String {
    if !arg.is_empty() && arg.chars().all(is_shell_safe) {
        return arg.into();
    }
    format!("'{}'", arg.replace('\'', r#"'\''"#))
}

/// Quote an argument for `cmd.exe`.
pub fn batch_quote(arg: &str) -> String {
    if !arg.is_empty() && arg.chars().all(is_shell_safe) {
        return arg.into();
    }
    format!("\"{}\"", arg.replace('"', "\"\"").replace('%', "%%"))
}

impl RenderScript {
    pub fn new(style: ScriptStyle, resampler: &str, wavtool: &str) -> Self {
        RenderScript {
            style,
            resampler: resampler.into(),
            wavtool: wavtool.into(),
        }
    }

    fn quote(&self, arg: &str) -> String {
        match self.style {
            ScriptStyle::Shell => shell_quote(arg),
            ScriptStyle::Batch => batch_quote(arg),
        }
    }

    fn write_command(
        &self,
        out: &mut dyn io::Write,
        tool: &str,
        arguments: &[String],
    ) -> io::Result<()> {
        write!(out, "{}", self.quote(tool))?;
        for argument in arguments {
            write!(out, " {}", self.quote(argument))?;
        }
        writeln!(out)
    }

    /// Write the whole script. Notes without a source sample only get appended by the wavtool.
    pub fn write(
        &self,
        out: &mut dyn io::Write,
        rendered: &[(ResamplerArgs, WavtoolArgs)],
    ) -> io::Result<()> {
        match self.style {
            ScriptStyle::Shell => writeln!(out, "#!/bin/sh\nset -e")?,
            ScriptStyle::Batch => writeln!(out, "@echo off")?,
        }
        for (resampler, wavtool) in rendered {
            if !resampler.in_file.is_empty() {
                self.write_command(out, &self.resampler, &resampler.arguments())?;
            }
            self.write_command(out, &self.wavtool, &wavtool.arguments())?;
        }
        debug!("wrote render script for {} notes", rendered.len());
        Ok(())
    }
}
