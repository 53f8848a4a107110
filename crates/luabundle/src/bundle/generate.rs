use crate::{ast::quote_string, metadata::BundleMetadata};

use super::{module::ModuleMap, options::BundleOptions};

/**
    Runtime loader placed at the top of every bundle.

    Identifiers in angle brackets are replaced with the configured names.
*/
const LOADER: &str = r#"local <require>, <loaded>, <register>, <modules> = (function(superRequire)
	local loadingPlaceholder = {[{}] = true}

	local register
	local modules = {}

	local require
	local loaded = {}

	register = function(name, body)
		if not modules[name] then
			modules[name] = body
		end
	end

	require = function(name)
		local loadedModule = loaded[name]

		if loadedModule then
			if loadedModule == loadingPlaceholder then
				return nil
			end
		else
			if not modules[name] then
				if not superRequire then
					local identifier = type(name) == 'string' and '"' .. name .. '"' or tostring(name)
					error('Tried to require ' .. identifier .. ', but no such module has been registered')
				else
					return superRequire(name)
				end
			end

			loaded[name] = loadingPlaceholder
			loadedModule = modules[name](require, loaded, register, modules)
			loaded[name] = loadedModule
		end

		return loadedModule
	end

	return require, loaded, register, modules
end)(<super_require>)
"#;

/**
    Generates a single Lua script from all of the given modules.

    The script registers every module with a small loader, in the order
    that the modules were processed, and finally requires the root module.
*/
#[must_use]
pub fn generate_bundle(modules: &ModuleMap, options: &BundleOptions) -> String {
    let identifiers = &options.identifiers;
    let super_require = if options.isolate { "nil" } else { "require" };

    let mut bundle = String::new();
    if options.metadata {
        bundle.push_str(&BundleMetadata::new(options).to_header());
        bundle.push('\n');
    }

    bundle.push_str(
        &LOADER
            .replace("<require>", &identifiers.require)
            .replace("<loaded>", &identifiers.loaded)
            .replace("<register>", &identifiers.register)
            .replace("<modules>", &identifiers.modules)
            .replace("<super_require>", super_require),
    );

    for module in modules {
        bundle.push_str(&format!(
            "{}({}, function(require, _LOADED, {}, {})\n{}\nend)\n",
            identifiers.register,
            quote_string(&module.name),
            identifiers.register,
            identifiers.modules,
            strip_shebang(&module.content),
        ));
    }

    bundle.push_str(&format!(
        "return {}({})\n",
        identifiers.require,
        quote_string(&options.root_module_name),
    ));

    bundle
}

/**
    Removes a shebang from the first line of the given source, if it has one.

    The newline after the shebang is kept so that line numbers stay the same.
*/
fn strip_shebang(content: &str) -> &str {
    if content.starts_with("#!") {
        match content.find('\n') {
            Some(newline) => &content[newline..],
            None => "",
        }
    } else {
        content
    }
}
