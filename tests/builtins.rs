use esengine::{EngineConfig, Interpreter, evaluate_script};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    match evaluate_script(script) {
        Ok(v) => v,
        Err(e) => e.to_string(),
    }
}

#[cfg(test)]
mod builtin_tests {
    use super::*;

    #[test]
    fn global_value_properties() {
        assert_eq!(eval("NaN = 1; undefined = 2; Infinity = 3; [isNaN(NaN), typeof undefined, Infinity].join()"), "true,undefined,Infinity");
        assert_eq!(eval("var d = Object.getOwnPropertyDescriptor(this, 'NaN'); [d.writable, d.enumerable, d.configurable].join()"), "false,false,false");
        assert_eq!(eval("parseInt('  0x1A') + parseInt('12abc') + parseFloat('3.5e1x')"), "73");
        assert_eq!(eval("isFinite('12') + ',' + isNaN('abc')"), "true,true");
    }

    #[test]
    fn object_builtins() {
        assert_eq!(eval("Object.keys({ b: 1, a: 2 }).join()"), "b,a");
        assert_eq!(eval("Object.getOwnPropertyNames([1, 2]).join()"), "0,1,length");
        assert_eq!(eval("var o = Object.create({ p: 1 }, { q: { value: 2, enumerable: true } }); o.p + o.q"), "3");
        assert_eq!(eval("Object.prototype.toString.call([])"), "[object Array]");
        assert_eq!(eval("Object.prototype.toString.call(null)"), "[object Null]");
        assert_eq!(eval("({}).hasOwnProperty.call({ a: 1 }, 'a')"), "true");
        assert_eq!(eval("Object.prototype.isPrototypeOf([])"), "true");
        assert_eq!(eval("[].propertyIsEnumerable('length')"), "false");
        assert_eq!(eval("typeof Object(1) + ',' + (Object(null) instanceof Object)"), "object,true");
    }

    #[test]
    fn array_builtins() {
        assert_eq!(eval("[3, 1, 2].sort().join()"), "1,2,3");
        assert_eq!(eval("[10, 9, 1].sort().join()"), "1,10,9");
        assert_eq!(eval("[10, 9, 1].sort(function (a, b) { return a - b; }).join()"), "1,9,10");
        assert_eq!(eval("var a = [1, 2, 3, 4, 5]; var r = a.splice(1, 2, 'x'); a.join() + '|' + r.join()"), "1,x,4,5|2,3");
        assert_eq!(eval("[1, [2, 3]].concat(4, [5]).length"), "5");
        assert_eq!(eval("[1, 2, 3].map(function (x) { return x * 2; }).filter(function (x) { return x > 2; }).join()"), "4,6");
        assert_eq!(eval("[1, 2, 3].reduce(function (a, b) { return a + b; })"), "6");
        assert_eq!(eval("['a', 'b'].reduceRight(function (a, b) { return a + b; }, '')"), "ba");
        assert_eq!(eval("[1, 2, 3].indexOf(2) + [1, 2, 1].lastIndexOf(1)"), "3");
        assert_eq!(eval("[1, 2].every(function (x) { return x > 0; }) + ',' + [1, 2].some(function (x) { return x > 1; })"), "true,true");
        assert_eq!(eval("var a = [1, 2]; a.unshift(0); a.push(3); a.shift() + a.pop() + a.length"), "5");
        assert_eq!(eval("[1, 2, 3].reverse().slice(-2).join()"), "2,1");
        assert_eq!(eval("Array.isArray([]) + ',' + Array.isArray({ length: 0 })"), "true,false");
        assert_eq!(eval("new Array(3).length + ',' + new Array(1, 2).length"), "3,2");
        assert_eq!(eval("try { [].reduce(function () {}); } catch (e) { e.name }"), "TypeError");
        assert_eq!(eval("[null, undefined, 1].join('-')"), "--1");
    }

    #[test]
    fn array_methods_are_generic() {
        let script = r#"
            var o = { length: 2, 0: 'a', 1: 'b' };
            Array.prototype.push.call(o, 'c');
            o.length + ':' + Array.prototype.join.call(o, '+')
        "#;
        assert_eq!(eval(script), "3:a+b+c");
        assert_eq!(eval("Array.prototype.map.call('abc', function (c) { return c.toUpperCase(); }).join('')"), "ABC");
    }

    #[test]
    fn string_builtins() {
        assert_eq!(eval("'Hello'.charAt(1) + 'Hello'.charCodeAt(1)"), "e101");
        assert_eq!(eval("'a-b-c'.split('-').join('+')"), "a+b+c");
        assert_eq!(eval("'Hello World'.replace(/o/g, '0')"), "Hell0 W0rld");
        assert_eq!(eval("'  trim me  '.trim()"), "trim me");
        assert_eq!(eval("'abc'.substring(2, 0) + 'abc'.substr(-2, 1) + 'abc'.slice(-1)"), "abbc");
        assert_eq!(eval("'x'.concat(1, null)"), "x1null");
        assert_eq!(eval("String.fromCharCode(0xD83D, 0xDE00).length"), "2");
    }

    #[test]
    fn regexp_builtins() {
        assert_eq!(eval("var m = /(\\d+)-(\\d+)/.exec('tel 12-34'); [m[0], m[1], m[2], m.index].join()"), "12-34,12,34,4");
        assert_eq!(eval("/^abc$/i.test('ABC') + ',' + /^abc$/.test('ABC')"), "true,false");
        assert_eq!(eval("String(/a\\/b/g)"), "/a\\/b/g");
        assert_eq!(eval("var r = /a/g; r.test('aa'); r.lastIndex"), "1");
        assert_eq!(eval("try { new RegExp('('); } catch (e) { e.name }"), "SyntaxError");
        assert_eq!(eval("try { new RegExp('a', 'gg'); } catch (e) { e.name }"), "SyntaxError");
        assert_eq!(eval("new RegExp('a+', 'g').global"), "true");
    }

    #[test]
    fn number_and_math_builtins() {
        assert_eq!(eval("(255).toString(16) + (0.5).toFixed(0) + (1e-7).toPrecision(2)"), "ff11.0e-7");
        assert_eq!(eval("Math.round(-0.5) + ',' + Math.round(2.5) + ',' + Math.pow(2, 10)"), "0,3,1024");
        assert_eq!(eval("Math.abs(-7) + Math.floor(2.9) + Math.ceil(0.1)"), "10");
        assert_eq!(eval("Number.MAX_VALUE > 1e308"), "true");
    }

    #[test]
    fn error_builtins() {
        assert_eq!(eval("var e = new RangeError('r'); [e.name, e.message, e instanceof Error, String(e)].join('|')"), "RangeError|r|true|RangeError: r");
        assert_eq!(eval("Error('called').message"), "called");
        assert_eq!(eval("new Error().toString()"), "Error");
        assert_eq!(eval("TypeError.prototype.name + ',' + (Object.getPrototypeOf(TypeError.prototype) === Error.prototype)"), "TypeError,true");
        assert_eq!(eval("new URIError('u').hasOwnProperty('message')"), "true");
        assert_eq!(eval("new EvalError().hasOwnProperty('message')"), "false");
    }

    #[test]
    fn date_builtins() {
        assert_eq!(eval("new Date(Date.UTC(2024, 1, 29, 12)).toISOString()"), "2024-02-29T12:00:00.000Z");
        assert_eq!(eval("Date.parse('2024-02-29T12:00:00.000Z')"), "1709208000000");
        assert_eq!(eval("new Date(2020, 5, 15).getMonth()"), "5");
        assert_eq!(eval("var d = new Date(0); d.setUTCFullYear(1999); d.getUTCFullYear()"), "1999");
        assert_eq!(eval("new Date(NaN).getTime() !== new Date(NaN).getTime()"), "true");
    }

    #[test]
    fn console_output_can_be_captured() {
        let mut interp = Interpreter::with_config(EngineConfig {
            capture_output: true,
            ..EngineConfig::default()
        });
        interp
            .evaluate("for (var i = 0; i < 3; i++) console.log('line', i);")
            .unwrap();
        assert_eq!(interp.take_output(), "line 0\nline 1\nline 2");
    }

    #[test]
    fn state_persists_across_evaluations() {
        let mut interp = Interpreter::new();
        interp.evaluate("var counter = 1; function bump() { return ++counter; }").unwrap();
        interp.evaluate("bump(); bump();").unwrap();
        let v = interp.evaluate("counter").unwrap();
        assert_eq!(interp.display_value(&v), "3");
    }

    #[test]
    fn garbage_collection_keeps_reachable_objects() {
        let mut interp = Interpreter::new();
        interp
            .evaluate("var keep = { nested: { value: 42 } }; for (var i = 0; i < 1000; i++) { var tmp = { i: i }; }")
            .unwrap();
        interp.collect_garbage();
        let v = interp.evaluate("keep.nested.value + tmp.i").unwrap();
        assert_eq!(interp.display_value(&v), "1041");
    }
}
